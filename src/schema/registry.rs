use std::collections::BTreeSet;

/// Read-only set of type names declared at the top level of a batch.
///
/// Built once before any schema is compiled and shared by every worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    enums: BTreeSet<String>,
    structs: BTreeSet<String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_enum(&mut self, name: &str) {
        self.enums.insert(name.to_string());
    }

    pub fn add_struct(&mut self, name: &str) {
        self.structs.insert(name.to_string());
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains(name)
    }

    pub fn is_struct(&self, name: &str) -> bool {
        self.structs.contains(name)
    }
}
