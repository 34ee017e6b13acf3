//! Name resolution for generated types.
//!
//! Every nested struct gets a globally unique type name derived from its owner
//! chain:
//!
//! - the root keeps its declared identifier, unmodified;
//! - a nested struct is `{parent}_{PascalCase(owning field)}`.
//!
//! So `DESampleComplex.rewards.condition` resolves to
//! `DESampleComplex_Rewards_Condition`. Collisions are reported, never
//! disambiguated: a silently renamed type would break hand-written call sites.

use std::collections::BTreeMap;

use heck::ToUpperCamelCase;

use crate::error::NameCollision;
use crate::schema::{Owner, StructId, TableSchema};

/// Resolved names of one table, keyed by [`StructId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedNames {
    root: String,
    structs: Vec<String>,
    order: Vec<StructId>,
}

impl ResolvedNames {
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn struct_name(&self, id: StructId) -> &str {
        &self.structs[id.index()]
    }

    /// Nested structs in emission order: a depth-first walk in field
    /// declaration order, children before the struct that contains them.
    pub fn emission_order(&self) -> &[StructId] {
        &self.order
    }

    /// Every name this table claims, paired with the owner path that produced
    /// it. The root comes first, then structs in emission order.
    pub fn claims<'a>(&'a self, schema: &'a TableSchema) -> Vec<(&'a str, &'a str)> {
        let mut claims = Vec::with_capacity(self.order.len() + 1);
        claims.push((self.root.as_str(), schema.name()));
        for id in &self.order {
            claims.push((self.struct_name(*id), schema.struct_def(*id).path()));
        }
        claims
    }
}

/// A namespace of claimed identifiers.
///
/// Each claim is tagged with an owner index so batch-level checks can tell which
/// unit held a name first.
#[derive(Debug, Default)]
pub struct NameScope {
    claimed: BTreeMap<String, (usize, String)>,
}

impl NameScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `owner`. On collision, returns the owner that already
    /// held the name together with a collision naming both paths.
    pub fn claim(&mut self, owner: usize, name: &str, path: &str) -> Result<(), (usize, NameCollision)> {
        if let Some((prev_owner, prev_path)) = self.claimed.get(name) {
            return Err((
                *prev_owner,
                NameCollision {
                    name: name.to_string(),
                    first: prev_path.clone(),
                    second: path.to_string(),
                },
            ));
        }

        self.claimed
            .insert(name.to_string(), (owner, path.to_string()));
        Ok(())
    }
}

/// Resolve type names for every nested struct of `schema`.
pub fn resolve_names(schema: &TableSchema) -> Result<ResolvedNames, NameCollision> {
    let mut resolver = Resolver {
        schema,
        scope: NameScope::new(),
        structs: vec![String::new(); schema.struct_count()],
        order: Vec::with_capacity(schema.struct_count()),
    };

    resolver
        .scope
        .claim(0, schema.name(), schema.name())
        .map_err(|(_, collision)| collision)?;
    resolver.visit(Owner::Root, schema.name())?;

    Ok(ResolvedNames {
        root: schema.name().to_string(),
        structs: resolver.structs,
        order: resolver.order,
    })
}

/// PascalCase a field name for use as a type-name segment.
pub fn type_segment(field_name: &str) -> String {
    field_name.to_upper_camel_case()
}

struct Resolver<'a> {
    schema: &'a TableSchema,
    scope: NameScope,
    structs: Vec<String>,
    order: Vec<StructId>,
}

impl Resolver<'_> {
    fn visit(&mut self, owner: Owner, parent_name: &str) -> Result<(), NameCollision> {
        let schema = self.schema;
        for field_id in schema.fields_of(owner) {
            let Some(struct_id) = schema.field(*field_id).ty().struct_id() else {
                continue;
            };

            let def = schema.struct_def(struct_id);
            let name = format!("{parent_name}_{}", type_segment(def.field_name()));
            self.scope
                .claim(0, &name, def.path())
                .map_err(|(_, collision)| collision)?;

            self.visit(Owner::Struct(struct_id), &name)?;
            self.structs[struct_id.index()] = name;
            self.order.push(struct_id);
        }
        Ok(())
    }
}
