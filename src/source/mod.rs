//! Schema source support
//!
//! The serde tree the compiler consumes, and loaders for TOML files.

pub mod parser;
pub mod types;

pub use parser::*;
pub use types::*;
