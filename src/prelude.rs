//! Prelude module for convenient imports.
//!
//! ```rust
//! use tablegen::prelude::*;
//! ```

pub use crate::config::{CompilerConfig, ProjectConfig};
pub use crate::emit::{Declaration, DeclarationKind, Emitter, GeneratedUnit};
pub use crate::error::{
    CompileError, ConfigError, ErrorKind, MalformedReason, NameCollision, SchemaError,
    TableGenError, TableGenResult, TypeMapError,
};
pub use crate::language::LanguageProfile;
pub use crate::pipeline::{BatchReport, CancellationToken, Compiler, SchemaBatch, SchemaOutcome};
pub use crate::schema::{DeclKind, Orientation, PrimitiveKind};
pub use crate::sink::{DirectorySink, MemorySink, UnitSink, WriteStatus};
pub use crate::source::{FieldSource, SchemaSource, TableSource};
