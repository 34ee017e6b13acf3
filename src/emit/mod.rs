//! Code emission
//!
//! A single generic [`Emitter`] turns a resolved schema into a
//! [`GeneratedUnit`], consulting a [`LanguageProfile`] for every layout
//! decision. Declarations come out in a fixed order: nested structs in the
//! resolver's emission order, then the schema's own declaration.
//!
//! Emission has no side effects; writing units somewhere is the job of a
//! [`crate::sink::UnitSink`].

mod writer;

use std::collections::BTreeMap;

use log::trace;
use strum::Display;

use crate::error::{CompileError, ErrorKind, NameCollision};
use crate::language::LanguageProfile;
use crate::mapper::map_type;
use crate::naming::ResolvedNames;
use crate::schema::{DeclKind, EnumSchema, FieldId, TableSchema};

use writer::{DeclarationWriter, join_unit};

/// What a rendered declaration is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeclarationKind {
    Class,
    Struct,
    Enum,
}

impl From<DeclKind> for DeclarationKind {
    fn from(kind: DeclKind) -> Self {
        match kind {
            DeclKind::Class => DeclarationKind::Class,
            DeclKind::Struct => DeclarationKind::Struct,
        }
    }
}

/// One rendered type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub kind: DeclarationKind,
    /// Rendered text without a trailing line ending
    pub text: String,
}

/// The emitted output for one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    name: String,
    declarations: Vec<Declaration>,
    text: String,
}

impl GeneratedUnit {
    /// The schema identifier this unit was generated from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations in emission order.
    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Full file text, header included.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn declaration_names(&self) -> Vec<&str> {
        self.declarations.iter().map(|d| d.name.as_str()).collect()
    }
}

/// Renders schemas with one language profile.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    profile: &'a LanguageProfile,
}

struct DeclarationParts<'s> {
    name: &'s str,
    kind: DeclKind,
    doc: Option<&'s str>,
    fields: &'s [FieldId],
}

impl<'a> Emitter<'a> {
    pub fn new(profile: &'a LanguageProfile) -> Self {
        Self { profile }
    }

    /// Render a table or shared struct schema.
    pub fn emit_table(
        &self,
        schema: &TableSchema,
        names: &ResolvedNames,
    ) -> Result<GeneratedUnit, CompileError> {
        let mut declarations = Vec::with_capacity(names.emission_order().len() + 1);

        for id in names.emission_order() {
            let def = schema.struct_def(*id);
            let parts = DeclarationParts {
                name: names.struct_name(*id),
                kind: def.kind(),
                doc: def.doc(),
                fields: def.fields(),
            };
            declarations.push(self.render_struct(schema, names, &parts)?);
        }

        let root = DeclarationParts {
            name: names.root(),
            kind: schema.kind(),
            doc: schema.doc(),
            fields: schema.root_fields(),
        };
        declarations.push(self.render_struct(schema, names, &root)?);

        trace!(
            "Emitted {} declarations for {} with profile {}",
            declarations.len(),
            schema.name(),
            self.profile.name
        );
        Ok(self.unit(schema.name(), declarations))
    }

    /// Render an enum schema as a single enum declaration.
    pub fn emit_enum(&self, schema: &EnumSchema) -> GeneratedUnit {
        let rules = &self.profile.render;
        let mut writer = DeclarationWriter::new(rules);
        writer.doc(schema.doc(), &[]);
        writer.open(&rules.enum_open, schema.name());

        let mut prev_documented = false;
        for (i, member) in schema.members().iter().enumerate() {
            let documented = member.doc().is_some();
            if i > 0 && rules.separate_documented_members && (documented || prev_documented) {
                writer.blank();
            }
            writer.doc(member.doc(), &[]);
            let name = self.profile.escape_reserved(member.name().to_string());
            writer.line(&rules.enum_member.replace("{name}", &name));
            prev_documented = documented;
        }
        writer.close();

        let declaration = Declaration {
            name: schema.name().to_string(),
            kind: DeclarationKind::Enum,
            text: writer.finish(),
        };
        self.unit(schema.name(), vec![declaration])
    }

    fn unit(&self, name: &str, declarations: Vec<Declaration>) -> GeneratedUnit {
        let texts: Vec<&str> = declarations.iter().map(|d| d.text.as_str()).collect();
        let text = join_unit(&self.profile.render, &texts);
        GeneratedUnit {
            name: name.to_string(),
            declarations,
            text,
        }
    }

    fn render_struct(
        &self,
        schema: &TableSchema,
        names: &ResolvedNames,
        parts: &DeclarationParts<'_>,
    ) -> Result<Declaration, CompileError> {
        let rules = &self.profile.render;
        let open = match parts.kind {
            DeclKind::Class => &rules.class_open,
            DeclKind::Struct => &rules.struct_open,
        };

        let mut writer = DeclarationWriter::new(rules);
        writer.doc(parts.doc, &[]);
        writer.open(open, parts.name);

        // member name -> path of the field that produced it
        let mut members: BTreeMap<String, &str> = BTreeMap::new();
        let mut prev_documented = false;

        for (i, field_id) in parts.fields.iter().enumerate() {
            let field = schema.field(*field_id);
            let expr = map_type(field.ty(), names, &self.profile.types).map_err(|e| {
                CompileError::at(schema.name(), field.path(), ErrorKind::TypeMap(e))
            })?;

            let member = self.profile.member_name(field.name());
            if let Some(first) = members.get(&member) {
                let collision = NameCollision {
                    name: member,
                    first: first.to_string(),
                    second: field.path().to_string(),
                };
                return Err(CompileError::new(schema.name(), collision.into()));
            }
            members.insert(member.clone(), field.path());

            let notes: Vec<String> = match (&rules.orientation_note, expr.orientation) {
                (Some(note), Some(orientation)) => {
                    vec![note.replace("{orientation}", &orientation.to_string())]
                }
                _ => Vec::new(),
            };

            let documented = field.doc().is_some() || !notes.is_empty();
            if i > 0 && rules.separate_documented_members && (documented || prev_documented) {
                writer.blank();
            }
            writer.doc(field.doc(), &notes);
            writer.line(
                &rules
                    .member
                    .replace("{type}", &expr.text)
                    .replace("{name}", &member),
            );
            prev_documented = documented;
        }
        writer.close();

        Ok(Declaration {
            name: parts.name.to_string(),
            kind: parts.kind.into(),
            text: writer.finish(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypeMapError;
    use crate::mapper::TypeShape;
    use crate::naming::resolve_names;
    use crate::schema::{Orientation, TypeRegistry, build_enum, build_table};
    use crate::source::{EnumMemberSource, EnumSource, FieldSource, TableSource};
    use assert_matches::assert_matches;

    fn sample_array() -> TableSource {
        let helper = || {
            vec![
                FieldSource::scalar("name", "string"),
                FieldSource::scalar("value", "int"),
            ]
        };
        TableSource::new(
            "DESampleArray",
            vec![
                FieldSource::scalar("id", "int"),
                FieldSource::scalar("colArr", "[int")
                    .with_doc("column array")
                    .with_orientation(Orientation::Column),
                FieldSource::scalar("rowArr", "[int").with_doc("row array"),
                FieldSource::inline("structColArr", true, helper())
                    .with_doc("struct array")
                    .with_kind(DeclKind::Class),
            ],
        )
        .with_doc("array sample")
    }

    fn emit(profile: &LanguageProfile, source: &TableSource) -> Result<GeneratedUnit, CompileError> {
        let schema = build_table(source, &TypeRegistry::new()).unwrap();
        let names = resolve_names(&schema).unwrap();
        Emitter::new(profile).emit_table(&schema, &names)
    }

    #[test]
    fn test_csharp_table_layout() {
        let profile = LanguageProfile::csharp();
        let unit = emit(&profile, &sample_array()).unwrap();

        assert_eq!(
            unit.declaration_names(),
            vec!["DESampleArray_StructColArr", "DESampleArray"]
        );
        let expected = [
            "using System.Collections.Generic;",
            "",
            "public class DESampleArray_StructColArr",
            "{",
            "    public string name;",
            "    public int value;",
            "}",
            "",
            "/// <summary>",
            "/// array sample",
            "/// </summary>",
            "public class DESampleArray",
            "{",
            "    public int id;",
            "",
            "    /// <summary>",
            "    /// column array",
            "    /// </summary>",
            "    public List<int> colArr;",
            "",
            "    /// <summary>",
            "    /// row array",
            "    /// </summary>",
            "    public List<int> rowArr;",
            "",
            "    /// <summary>",
            "    /// struct array",
            "    /// </summary>",
            "    public List<DESampleArray_StructColArr> structColArr;",
            "}",
            "",
        ]
        .join("\r\n");
        assert_eq!(unit.text(), expected);
    }

    #[test]
    fn test_rust_profile_notes_orientation() {
        let profile = LanguageProfile::rust();
        let unit = emit(&profile, &sample_array()).unwrap();
        let root = &unit.declarations()[1];

        assert_eq!(root.kind, DeclarationKind::Class);
        assert!(root.text.contains("    /// column array\n    /// Array orientation: column.\n    pub col_arr: Vec<i32>,"));
        assert!(root.text.contains("    /// Array orientation: row.\n    pub row_arr: Vec<i32>,"));
        assert!(root.text.contains("pub struct_col_arr: Vec<DESampleArray_StructColArr>,"));
    }

    #[test]
    fn test_member_collision_after_case_transform() {
        let source = TableSource::new(
            "DEShop",
            vec![
                FieldSource::scalar("itemId", "int"),
                FieldSource::scalar("item_id", "int"),
            ],
        );
        // Kept verbatim in C#, these are distinct members.
        assert!(emit(&LanguageProfile::csharp(), &source).is_ok());

        let err = emit(&LanguageProfile::rust(), &source).unwrap_err();
        assert_eq!(err.schema, "DEShop");
        assert_eq!(err.path, "DEShop.item_id");
        assert_matches!(
            err.kind,
            ErrorKind::Collision(NameCollision { ref name, ref first, .. })
                if name == "item_id" && first == "DEShop.itemId"
        );
    }

    #[test]
    fn test_reserved_member_is_escaped() {
        let source = TableSource::new("DEEvent", vec![FieldSource::scalar("event", "string")]);
        let unit = emit(&LanguageProfile::csharp(), &source).unwrap();
        assert!(unit.text().contains("public string @event;"));
    }

    #[test]
    fn test_missing_type_entry_names_field() {
        let mut profile = LanguageProfile::csharp();
        profile.types.float = None;
        let source = TableSource::new(
            "DEDrop",
            vec![FieldSource::inline(
                "reward",
                false,
                vec![FieldSource::scalar("rate", "float")],
            )],
        );

        let err = emit(&profile, &source).unwrap_err();
        assert_eq!(err.path, "DEDrop.reward.rate");
        assert_matches!(
            err.kind,
            ErrorKind::TypeMap(TypeMapError::UnsupportedType { shape: TypeShape::Float })
        );
    }

    #[test]
    fn test_enum_unit() {
        let source = EnumSource {
            name: "DEDayOfWeek".to_string(),
            doc: Some("day of week".to_string()),
            members: vec![
                EnumMemberSource { name: "Sunday".to_string(), doc: None },
                EnumMemberSource { name: "Monday".to_string(), doc: None },
                EnumMemberSource { name: "Tuesday".to_string(), doc: Some("third".to_string()) },
            ],
        };
        let schema = build_enum(&source).unwrap();
        let unit = Emitter::new(&LanguageProfile::rust()).emit_enum(&schema);

        assert_eq!(unit.name(), "DEDayOfWeek");
        assert_eq!(unit.declarations()[0].kind, DeclarationKind::Enum);
        let expected = "\
// Generated by tablegen. Do not edit.

/// day of week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DEDayOfWeek {
    Sunday,
    Monday,

    /// third
    Tuesday,
}
";
        assert_eq!(unit.text(), expected);
    }

    #[test]
    fn test_reserved_enum_members_are_escaped() {
        let members = ["default", "event", "Normal"]
            .into_iter()
            .map(|name| EnumMemberSource { name: name.to_string(), doc: None })
            .collect();
        let source = EnumSource {
            name: "DEKind".to_string(),
            doc: None,
            members,
        };
        let schema = build_enum(&source).unwrap();

        let csharp = Emitter::new(&LanguageProfile::csharp()).emit_enum(&schema);
        let text = csharp.text();
        assert!(text.contains("    @default,\r\n    @event,\r\n    Normal,\r\n"));

        // Enum members keep their case; only the escape applies.
        let rust = Emitter::new(&LanguageProfile::rust()).emit_enum(&schema);
        assert!(rust.text().contains("    default,\n    event,\n    Normal,\n"));
    }
}
