//! Type mapping from logical field types to target-language type expressions.
//!
//! Mapping is a pure function of the field's [`TypeRef`], the resolved struct
//! names and the language's [`TypeTable`]. A missing table entry is reported
//! here, at mapping time, rather than surfacing later as a compile failure of
//! the generated code.

use strum::{Display, EnumIter};

use crate::error::TypeMapError;
use crate::language::TypeTable;
use crate::naming::ResolvedNames;
use crate::schema::{ElementRef, Orientation, PrimitiveKind, TypeRef};

/// The closed set of type shapes a language's type table covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum TypeShape {
    Int,
    Float,
    Bool,
    String,
    Enum,
    Struct,
    ArrayOfPrimitive,
    ArrayOfStruct,
}

impl From<PrimitiveKind> for TypeShape {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Int => TypeShape::Int,
            PrimitiveKind::Float => TypeShape::Float,
            PrimitiveKind::Bool => TypeShape::Bool,
            PrimitiveKind::String => TypeShape::String,
        }
    }
}

/// A rendered type plus the metadata the emitter needs for documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpression {
    pub text: String,
    pub shape: TypeShape,
    /// Set for arrays only. Never affects `text`.
    pub orientation: Option<Orientation>,
}

/// Map a field type to its target-language expression.
pub fn map_type(
    ty: &TypeRef,
    names: &ResolvedNames,
    table: &TypeTable,
) -> Result<TypeExpression, TypeMapError> {
    match ty {
        TypeRef::Array {
            element,
            orientation,
        } => {
            let (element_text, element_shape) = map_element(element, names, table)?;
            let shape = match element_shape {
                TypeShape::Struct => TypeShape::ArrayOfStruct,
                _ => TypeShape::ArrayOfPrimitive,
            };
            let container = lookup(table, shape)?;
            Ok(TypeExpression {
                text: container.replace("{element}", &element_text),
                shape,
                orientation: Some(*orientation),
            })
        }
        TypeRef::Primitive(kind) => scalar(ElementRef::Primitive(*kind), names, table),
        TypeRef::Enum(name) => scalar(ElementRef::Enum(name.clone()), names, table),
        TypeRef::Struct(id) => scalar(ElementRef::Struct(*id), names, table),
        TypeRef::External(name) => scalar(ElementRef::External(name.clone()), names, table),
    }
}

fn scalar(
    element: ElementRef,
    names: &ResolvedNames,
    table: &TypeTable,
) -> Result<TypeExpression, TypeMapError> {
    let (text, shape) = map_element(&element, names, table)?;
    Ok(TypeExpression {
        text,
        shape,
        orientation: None,
    })
}

fn map_element(
    element: &ElementRef,
    names: &ResolvedNames,
    table: &TypeTable,
) -> Result<(String, TypeShape), TypeMapError> {
    match element {
        ElementRef::Primitive(kind) => {
            let shape = TypeShape::from(*kind);
            Ok((lookup(table, shape)?.to_string(), shape))
        }
        ElementRef::Enum(name) => {
            let template = lookup(table, TypeShape::Enum)?;
            Ok((template.replace("{name}", name), TypeShape::Enum))
        }
        ElementRef::Struct(id) => {
            let template = lookup(table, TypeShape::Struct)?;
            Ok((template.replace("{name}", names.struct_name(*id)), TypeShape::Struct))
        }
        ElementRef::External(name) => {
            let template = lookup(table, TypeShape::Struct)?;
            Ok((template.replace("{name}", name), TypeShape::Struct))
        }
    }
}

fn lookup(table: &TypeTable, shape: TypeShape) -> Result<&str, TypeMapError> {
    table
        .template(shape)
        .ok_or(TypeMapError::UnsupportedType { shape })
}
