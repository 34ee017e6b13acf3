//! Schema source type definitions
//!
//! This module defines the Serde types for the intermediate schema tree handed
//! to the compiler. It carries no authoring-syntax concerns: any front end
//! (spreadsheet exporter, DSL, hand-written TOML) just has to produce this tree.

use serde::{Deserialize, Serialize};

use crate::schema::{DeclKind, Orientation};

/// One schema source: a set of enums, shared structs and tables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SchemaSource {
    #[serde(default)]
    pub enums: Vec<EnumSource>,
    #[serde(default)]
    pub structs: Vec<TableSource>,
    #[serde(default)]
    pub tables: Vec<TableSource>,
}

/// A table row definition, or a shared struct when listed under `structs`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TableSource {
    pub name: String,
    pub doc: Option<String>,
    /// Declaration kind of the table itself
    pub kind: Option<DeclKind>,
    /// Default declaration kind of nested structs
    pub nested_kind: Option<DeclKind>,
    #[serde(default)]
    pub fields: Vec<FieldSource>,
    /// Named local struct templates, usable as field types inside this table
    #[serde(default)]
    pub structs: Vec<StructTemplateSource>,
}

/// A named struct template local to one table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StructTemplateSource {
    pub name: String,
    pub doc: Option<String>,
    pub kind: Option<DeclKind>,
    #[serde(default)]
    pub fields: Vec<FieldSource>,
}

/// A field definition.
///
/// `type` follows the exporter convention: a leading `[` marks an array, the
/// remainder names a primitive, enum, shared struct or template, and an empty
/// remainder means the field introduces an inline struct from `fields`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FieldSource {
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    pub doc: Option<String>,
    pub orientation: Option<Orientation>,
    /// Declaration kind of the inline struct this field introduces
    pub kind: Option<DeclKind>,
    /// Documentation of the inline struct this field introduces
    pub struct_doc: Option<String>,
    pub fields: Option<Vec<FieldSource>>,
}

/// An enum definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EnumSource {
    pub name: String,
    pub doc: Option<String>,
    #[serde(default)]
    pub members: Vec<EnumMemberSource>,
}

/// An enum member.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct EnumMemberSource {
    pub name: String,
    pub doc: Option<String>,
}

/// Split a type string into its array flag and element name.
///
/// `"[int"` is an int array, `"["` an array of an inline struct and `""` an
/// inline struct.
pub fn parse_type_string(type_string: &str) -> (bool, &str) {
    match type_string.strip_prefix('[') {
        Some(rest) => (true, rest),
        None => (false, type_string),
    }
}

impl FieldSource {
    /// A scalar field of the given type.
    pub fn scalar(name: &str, type_name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            ..Self::default()
        }
    }

    /// A field introducing an inline struct (or an array of it when `array`).
    pub fn inline(name: &str, array: bool, fields: Vec<FieldSource>) -> Self {
        Self {
            name: name.to_string(),
            type_name: if array { "[".to_string() } else { String::new() },
            fields: Some(fields),
            ..Self::default()
        }
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn with_struct_doc(mut self, doc: &str) -> Self {
        self.struct_doc = Some(doc.to_string());
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_kind(mut self, kind: DeclKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl TableSource {
    pub fn new(name: &str, fields: Vec<FieldSource>) -> Self {
        Self {
            name: name.to_string(),
            fields,
            ..Self::default()
        }
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn with_template(mut self, template: StructTemplateSource) -> Self {
        self.structs.push(template);
        self
    }
}
