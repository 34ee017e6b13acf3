//! Construction of the schema model from a source tree.
//!
//! All structural validation happens here, once. A schema that builds is a
//! finite tree with resolvable types, no nested arrays and unique member names
//! per owner; later passes rely on that and never re-check it.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use log::trace;

use crate::error::{MalformedReason, SchemaError};
use crate::schema::model::*;
use crate::schema::registry::TypeRegistry;
use crate::source::{
    EnumSource, FieldSource, StructTemplateSource, TableSource, parse_type_string,
};

/// Build a table schema. Tables render as classes unless they say otherwise.
pub fn build_table(source: &TableSource, registry: &TypeRegistry) -> Result<TableSchema, SchemaError> {
    SchemaBuilder::new(source, registry).build(DeclKind::Class)
}

/// Build a shared struct schema. Shared structs render as value types unless
/// they say otherwise.
pub fn build_shared_struct(
    source: &TableSource,
    registry: &TypeRegistry,
) -> Result<TableSchema, SchemaError> {
    SchemaBuilder::new(source, registry).build(DeclKind::Struct)
}

/// Build an enum schema.
pub fn build_enum(source: &EnumSource) -> Result<EnumSchema, SchemaError> {
    check_identifier(&source.name, &source.name)?;

    if source.members.is_empty() {
        return Err(SchemaError::malformed(&source.name, MalformedReason::Empty));
    }

    let mut seen = BTreeSet::new();
    let mut members = Vec::with_capacity(source.members.len());
    for member in &source.members {
        let path = format!("{}.{}", source.name, member.name);
        check_identifier(&member.name, &path)?;
        if !seen.insert(member.name.as_str()) {
            return Err(SchemaError::malformed(
                path,
                MalformedReason::DuplicateField(member.name.clone()),
            ));
        }
        members.push(EnumMember {
            name: member.name.clone(),
            doc: non_empty(&member.doc),
        });
    }

    Ok(EnumSchema {
        name: source.name.clone(),
        doc: non_empty(&source.doc),
        members,
    })
}

/// Find shared structs that contain themselves, directly or through other
/// shared structs. Returns the error for every struct on a cycle, keyed by
/// struct name; each chain starts and ends at the struct it is reported for.
///
/// Edges follow resolution order: a name that is a primitive, a local
/// template or an enum is not a shared-struct reference. Templates are
/// expanded in place, and array references count like scalar ones.
pub fn shared_struct_cycles<'a>(
    sources: impl IntoIterator<Item = &'a TableSource>,
    registry: &TypeRegistry,
) -> BTreeMap<String, SchemaError> {
    let mut graph: BTreeMap<&'a str, Vec<&'a str>> = BTreeMap::new();
    for source in sources {
        let templates: BTreeMap<&'a str, &'a StructTemplateSource> = source
            .structs
            .iter()
            .map(|template| (template.name.as_str(), template))
            .collect();
        let mut deps = Vec::new();
        shared_dependencies(&source.fields, &templates, registry, &mut BTreeSet::new(), &mut deps);
        graph.entry(source.name.as_str()).or_insert(deps);
    }

    let mut state = BTreeMap::new();
    let mut failures = BTreeMap::new();
    for name in graph.keys() {
        let mut stack = Vec::new();
        visit_shared(*name, &graph, &mut state, &mut stack, &mut failures);
    }
    if !failures.is_empty() {
        trace!("Cyclic shared structs: {:?}", failures.keys().collect::<Vec<_>>());
    }
    failures
}

fn shared_dependencies<'a>(
    fields: &'a [FieldSource],
    templates: &BTreeMap<&'a str, &'a StructTemplateSource>,
    registry: &TypeRegistry,
    expanded: &mut BTreeSet<&'a str>,
    deps: &mut Vec<&'a str>,
) {
    for field in fields {
        if let Some(inline) = &field.fields {
            shared_dependencies(inline, templates, registry, expanded, deps);
        }
        let (_, element) = parse_type_string(field.type_name.trim());
        if PrimitiveKind::from_str(element).is_ok() {
            continue;
        }
        match templates.get_key_value(element).map(|(name, template)| (*name, *template)) {
            Some((name, template)) => {
                if expanded.insert(name) {
                    shared_dependencies(&template.fields, templates, registry, expanded, deps);
                }
            }
            None if !registry.is_enum(element) && registry.is_struct(element) => deps.push(element),
            None => {}
        }
    }
}

fn visit_shared<'a>(
    name: &'a str,
    graph: &BTreeMap<&'a str, Vec<&'a str>>,
    state: &mut BTreeMap<&'a str, VisitState>,
    stack: &mut Vec<&'a str>,
    failures: &mut BTreeMap<String, SchemaError>,
) {
    match state.get(name) {
        Some(VisitState::Done) => return,
        Some(VisitState::Visiting) => {
            let start = stack.iter().position(|n| *n == name).unwrap_or(0);
            let cycle = &stack[start..];
            for (i, member) in cycle.iter().enumerate() {
                let chain: Vec<String> = cycle[i..]
                    .iter()
                    .chain(&cycle[..=i])
                    .map(|n| n.to_string())
                    .collect();
                failures
                    .entry(member.to_string())
                    .or_insert_with(|| SchemaError::malformed(*member, MalformedReason::CyclicStruct(chain)));
            }
            return;
        }
        None => {}
    }

    state.insert(name, VisitState::Visiting);
    stack.push(name);
    if let Some(deps) = graph.get(name) {
        for dep in deps {
            visit_shared(*dep, graph, state, stack, failures);
        }
    }
    stack.pop();
    state.insert(name, VisitState::Done);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Done,
}

struct SchemaBuilder<'a> {
    source: &'a TableSource,
    registry: &'a TypeRegistry,
    templates: BTreeMap<&'a str, &'a StructTemplateSource>,
    nested_kind: DeclKind,
    fields: Vec<Field>,
    structs: Vec<StructDef>,
}

impl<'a> SchemaBuilder<'a> {
    fn new(source: &'a TableSource, registry: &'a TypeRegistry) -> Self {
        Self {
            source,
            registry,
            templates: BTreeMap::new(),
            nested_kind: source.nested_kind.unwrap_or(DeclKind::Struct),
            fields: Vec::new(),
            structs: Vec::new(),
        }
    }

    fn build(mut self, default_kind: DeclKind) -> Result<TableSchema, SchemaError> {
        let source = self.source;
        let name = source.name.as_str();
        check_identifier(name, name)?;

        self.collect_templates()?;
        self.check_template_cycles()?;

        let root_fields = self.add_fields(Owner::Root, name, &source.fields)?;
        trace!(
            "Built schema {name}: {} fields, {} nested structs",
            self.fields.len(),
            self.structs.len()
        );

        Ok(TableSchema {
            name: name.to_string(),
            doc: non_empty(&source.doc),
            kind: source.kind.unwrap_or(default_kind),
            root_fields,
            field_arena: self.fields,
            struct_arena: self.structs,
        })
    }

    fn collect_templates(&mut self) -> Result<(), SchemaError> {
        let source = self.source;
        for template in &source.structs {
            let path = format!("{}.{}", source.name, template.name);
            check_identifier(&template.name, &path)?;
            if self.templates.insert(&template.name, template).is_some() {
                return Err(SchemaError::malformed(
                    path,
                    MalformedReason::DuplicateField(template.name.clone()),
                ));
            }
        }
        Ok(())
    }

    /// Reject templates that contain themselves, directly or through other
    /// templates. Each template is visited at most once, so this terminates on
    /// any input.
    fn check_template_cycles(&self) -> Result<(), SchemaError> {
        let source = self.source;
        let mut state = BTreeMap::new();
        for template in &source.structs {
            let mut stack = Vec::new();
            self.visit_template(&template.name, &mut state, &mut stack)?;
        }
        Ok(())
    }

    fn visit_template(
        &self,
        name: &'a str,
        state: &mut BTreeMap<&'a str, VisitState>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), SchemaError> {
        match state.get(name) {
            Some(VisitState::Done) => return Ok(()),
            Some(VisitState::Visiting) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(name.to_string());
                return Err(SchemaError::malformed(
                    format!("{}.{}", self.source.name, stack[start]),
                    MalformedReason::CyclicStruct(cycle),
                ));
            }
            None => {}
        }

        state.insert(name, VisitState::Visiting);
        stack.push(name);

        if let Some(template) = self.templates.get(name).copied() {
            let mut deps = Vec::new();
            self.template_dependencies(&template.fields, &mut deps);
            for dep in deps {
                self.visit_template(dep, state, stack)?;
            }
        }

        stack.pop();
        state.insert(name, VisitState::Done);
        Ok(())
    }

    fn template_dependencies(&self, fields: &'a [FieldSource], deps: &mut Vec<&'a str>) {
        for field in fields {
            if let Some(inline) = &field.fields {
                self.template_dependencies(inline, deps);
            }
            let (_, element) = parse_type_string(field.type_name.trim());
            if PrimitiveKind::from_str(element).is_err()
                && let Some((name, _)) = self.templates.get_key_value(element)
            {
                deps.push(*name);
            }
        }
    }

    fn add_fields(
        &mut self,
        owner: Owner,
        owner_path: &str,
        sources: &'a [FieldSource],
    ) -> Result<Vec<FieldId>, SchemaError> {
        if sources.is_empty() {
            return Err(SchemaError::malformed(owner_path, MalformedReason::Empty));
        }

        let mut seen = BTreeSet::new();
        let mut ids = Vec::with_capacity(sources.len());
        for source in sources {
            let path = format!("{owner_path}.{}", source.name);
            check_identifier(&source.name, &path)?;
            if !seen.insert(source.name.as_str()) {
                return Err(SchemaError::malformed(
                    path,
                    MalformedReason::DuplicateField(source.name.clone()),
                ));
            }

            let ty = self.resolve_field_type(owner, &path, source)?;
            let id = FieldId::from(self.fields.len());
            self.fields.push(Field {
                name: source.name.clone(),
                doc: non_empty(&source.doc),
                ty,
                owner,
                path,
            });
            ids.push(id);
        }

        Ok(ids)
    }

    fn resolve_field_type(
        &mut self,
        owner: Owner,
        path: &str,
        source: &'a FieldSource,
    ) -> Result<TypeRef, SchemaError> {
        let (is_array, element) = parse_type_string(source.type_name.trim());

        if element.starts_with('[') {
            return Err(SchemaError::malformed(path, MalformedReason::NestedArray));
        }
        if source.orientation.is_some() && !is_array {
            return Err(SchemaError::malformed(path, MalformedReason::OrientationOnScalar));
        }

        let element = match (&source.fields, element.is_empty()) {
            (Some(_), false) => {
                return Err(SchemaError::malformed(
                    path,
                    MalformedReason::AmbiguousType(element.to_string()),
                ));
            }
            (Some(fields), true) => {
                let id = self.add_struct(
                    owner,
                    path,
                    source,
                    non_empty(&source.struct_doc),
                    source.kind,
                    fields,
                )?;
                ElementRef::Struct(id)
            }
            (None, true) => {
                return Err(SchemaError::malformed(path, MalformedReason::MissingType));
            }
            (None, false) => self.resolve_named(owner, path, source, element)?,
        };

        if is_array {
            Ok(TypeRef::Array {
                element,
                orientation: source.orientation.unwrap_or_default(),
            })
        } else {
            Ok(element.into())
        }
    }

    fn resolve_named(
        &mut self,
        owner: Owner,
        path: &str,
        source: &'a FieldSource,
        name: &str,
    ) -> Result<ElementRef, SchemaError> {
        if let Ok(kind) = PrimitiveKind::from_str(name) {
            return Ok(ElementRef::Primitive(kind));
        }

        if let Some(template) = self.templates.get(name).copied() {
            let doc = non_empty(&source.struct_doc).or_else(|| non_empty(&template.doc));
            let kind = source.kind.or(template.kind);
            let id = self.add_struct(owner, path, source, doc, kind, &template.fields)?;
            return Ok(ElementRef::Struct(id));
        }

        if self.registry.is_enum(name) {
            return Ok(ElementRef::Enum(name.to_string()));
        }
        if self.registry.is_struct(name) {
            return Ok(ElementRef::External(name.to_string()));
        }

        Err(SchemaError::malformed(
            path,
            MalformedReason::UnresolvedType(name.to_string()),
        ))
    }

    fn add_struct(
        &mut self,
        parent: Owner,
        path: &str,
        source: &FieldSource,
        doc: Option<String>,
        kind: Option<DeclKind>,
        fields: &'a [FieldSource],
    ) -> Result<StructId, SchemaError> {
        let id = StructId::from(self.structs.len());
        self.structs.push(StructDef {
            parent,
            field_name: source.name.clone(),
            path: path.to_string(),
            doc,
            kind: kind.unwrap_or(self.nested_kind),
            fields: Vec::new(),
        });

        let field_ids = self.add_fields(Owner::Struct(id), path, fields)?;
        self.structs[id.index()].fields = field_ids;

        Ok(id)
    }
}

fn non_empty(doc: &Option<String>) -> Option<String> {
    doc.as_ref().filter(|d| !d.trim().is_empty()).cloned()
}

fn check_identifier(name: &str, path: &str) -> Result<(), SchemaError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SchemaError::malformed(
            path,
            MalformedReason::InvalidIdentifier(name.to_string()),
        ))
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
