//! The schema model: an immutable, arena-backed tree per table, built and
//! validated from a [`crate::source`] tree.

pub mod builder;
pub mod model;
pub mod registry;

pub use builder::{
    build_enum, build_shared_struct, build_table, is_identifier, shared_struct_cycles,
};
pub use model::*;
pub use registry::TypeRegistry;
