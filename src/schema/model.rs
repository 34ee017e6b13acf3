//! Immutable schema model.
//!
//! A [`TableSchema`] owns two flat arenas: one of [`Field`]s and one of
//! [`StructDef`]s. Nodes refer to each other through [`FieldId`] and
//! [`StructId`] indices rather than owning references, so the nesting tree can
//! be walked, annotated and re-walked without borrowing knots. Downstream
//! passes attach their own data in side tables keyed by these ids.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

/// Index of a [`StructDef`] inside its owning [`TableSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
pub struct StructId(usize);

/// Index of a [`Field`] inside its owning [`TableSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
pub struct FieldId(usize);

impl StructId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl FieldId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Cell value kinds a table field can hold.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumString,
    EnumIter,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Int,
    Float,
    Bool,
    String,
}

/// How array elements are laid out in the authored table.
///
/// This is carried as metadata only; it never changes the generated container.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Row,
    Column,
}

/// Whether a declaration renders as a reference type or a value type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Class,
    Struct,
}

/// Element type of an array. Has no array variant, so nested arrays cannot be
/// expressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Primitive(PrimitiveKind),
    Enum(String),
    Struct(StructId),
    External(String),
}

/// The logical type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveKind),
    /// Reference to an enum declared elsewhere in the batch
    Enum(String),
    /// Nested struct owned by this field
    Struct(StructId),
    /// Reference to a shared struct declared elsewhere in the batch
    External(String),
    Array {
        element: ElementRef,
        orientation: Orientation,
    },
}

impl TypeRef {
    /// The nested struct this type introduces, if any.
    pub fn struct_id(&self) -> Option<StructId> {
        match self {
            TypeRef::Struct(id)
            | TypeRef::Array {
                element: ElementRef::Struct(id),
                ..
            } => Some(*id),
            _ => None,
        }
    }

    pub fn orientation(&self) -> Option<Orientation> {
        match self {
            TypeRef::Array { orientation, .. } => Some(*orientation),
            _ => None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array { .. })
    }
}

impl From<ElementRef> for TypeRef {
    fn from(element: ElementRef) -> Self {
        match element {
            ElementRef::Primitive(kind) => TypeRef::Primitive(kind),
            ElementRef::Enum(name) => TypeRef::Enum(name),
            ElementRef::Struct(id) => TypeRef::Struct(id),
            ElementRef::External(name) => TypeRef::External(name),
        }
    }
}

/// The container that directly holds a field or struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Root,
    Struct(StructId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    pub(crate) ty: TypeRef,
    pub(crate) owner: Owner,
    pub(crate) path: String,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Dot-joined owner chain, e.g. `DESampleComplex.rewards.condition`
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A nested struct introduced by a field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub(crate) parent: Owner,
    pub(crate) field_name: String,
    pub(crate) path: String,
    pub(crate) doc: Option<String>,
    pub(crate) kind: DeclKind,
    pub(crate) fields: Vec<FieldId>,
}

impl StructDef {
    pub fn parent(&self) -> Owner {
        self.parent
    }

    /// Name of the field that introduces this struct.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Path of the field that introduces this struct.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }
}

/// A compiled table (or shared struct) definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    pub(crate) kind: DeclKind,
    pub(crate) root_fields: Vec<FieldId>,
    pub(crate) field_arena: Vec<Field>,
    pub(crate) struct_arena: Vec<StructDef>,
}

impl TableSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    /// Direct fields of the table, in declaration order.
    pub fn root_fields(&self) -> &[FieldId] {
        &self.root_fields
    }

    /// Fields of a container, in declaration order.
    pub fn fields_of(&self, owner: Owner) -> &[FieldId] {
        match owner {
            Owner::Root => &self.root_fields,
            Owner::Struct(id) => &self.struct_arena[id.index()].fields,
        }
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.field_arena[id.index()]
    }

    pub fn struct_def(&self, id: StructId) -> &StructDef {
        &self.struct_arena[id.index()]
    }

    pub fn struct_count(&self) -> usize {
        self.struct_arena.len()
    }

    pub fn structs(&self) -> impl Iterator<Item = (StructId, &StructDef)> {
        self.struct_arena
            .iter()
            .enumerate()
            .map(|(idx, def)| (StructId(idx), def))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
}

impl EnumMember {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

/// A compiled enum definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSchema {
    pub(crate) name: String,
    pub(crate) doc: Option<String>,
    pub(crate) members: Vec<EnumMember>,
}

impl EnumSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }
}
