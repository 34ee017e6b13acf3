//! Error types for tablegen.
//!
//! Compilation errors are split in two families:
//!
//! - **Per-schema errors** ([`CompileError`]) are local to one schema's pipeline.
//!   The orchestrator records them against that schema and keeps going with the
//!   rest of the batch.
//! - **Batch errors** ([`TableGenError`], [`ConfigError`]) stop a batch before it
//!   starts or come from collaborators (reading sources, writing output).
//!
//! Every per-schema failure is a structured value carrying the schema identifier,
//! the owner path of the offending node and the error kind.
//!
//! ```
//! use tablegen::error::{CompileError, ErrorKind, SchemaError, MalformedReason};
//!
//! let err = CompileError::new(
//!     "DESampleArray",
//!     ErrorKind::Schema(SchemaError::Malformed {
//!         path: "DESampleArray.colArr".to_string(),
//!         reason: MalformedReason::NestedArray,
//!     }),
//! );
//! assert_eq!(err.path, "DESampleArray.colArr");
//! assert!(err.to_string().contains("nested arrays"));
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::mapper::TypeShape;

/// Result type alias for crate-level operations.
pub type TableGenResult<T> = Result<T, TableGenError>;

/// Crate-level error for batch setup and collaborator I/O.
#[derive(Error, Debug)]
pub enum TableGenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read schema source '{path}': {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema source '{origin}': {message}")]
    SourceParse { origin: String, message: String },

    #[error("Failed to write generated unit '{name}' to '{path}': {source}")]
    SinkWrite {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration failures. These are batch-fatal: no schema can be compiled
/// without a valid language profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown built-in language profile '{0}'")]
    UnknownLanguage(String),

    #[error("Failed to parse configuration '{origin}': {message}")]
    Parse { origin: String, message: String },

    #[error("Template for '{entry}' must contain '{placeholder}', got '{template}'")]
    MissingPlaceholder {
        entry: String,
        placeholder: &'static str,
        template: String,
    },

    #[error("Language profile '{profile}' has an invalid setting '{setting}': {message}")]
    InvalidSetting {
        profile: String,
        setting: &'static str,
        message: String,
    },
}

/// A failure while compiling one schema, tagged with the schema identifier and
/// the owner path of the offending node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{schema}: {kind}")]
pub struct CompileError {
    pub schema: String,
    pub path: String,
    pub kind: ErrorKind,
}

impl CompileError {
    /// Wrap an error kind, taking the offending path from the kind itself.
    pub fn new(schema: impl Into<String>, kind: ErrorKind) -> Self {
        let path = kind.path().to_string();
        Self {
            schema: schema.into(),
            path,
            kind,
        }
    }

    /// Wrap an error kind raised at an explicit path.
    pub fn at(schema: impl Into<String>, path: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            schema: schema.into(),
            path: path.into(),
            kind,
        }
    }
}

/// The error kinds a schema pipeline can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Collision(#[from] NameCollision),

    #[error(transparent)]
    TypeMap(#[from] TypeMapError),
}

impl ErrorKind {
    fn path(&self) -> &str {
        match self {
            ErrorKind::Schema(SchemaError::Malformed { path, .. }) => path,
            ErrorKind::Collision(collision) => &collision.second,
            ErrorKind::TypeMap(_) => "",
        }
    }
}

/// Construction-time failures of the schema model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("malformed schema at '{path}': {reason}")]
    Malformed {
        path: String,
        reason: MalformedReason,
    },
}

impl SchemaError {
    pub(crate) fn malformed(path: impl Into<String>, reason: MalformedReason) -> Self {
        SchemaError::Malformed {
            path: path.into(),
            reason,
        }
    }

    pub fn reason(&self) -> &MalformedReason {
        match self {
            SchemaError::Malformed { reason, .. } => reason,
        }
    }
}

/// Why a schema could not be turned into a model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("type '{0}' does not name a primitive, struct template, enum or shared struct")]
    UnresolvedType(String),

    #[error("field has neither a type nor inline fields")]
    MissingType,

    #[error("field declares both type '{0}' and inline fields")]
    AmbiguousType(String),

    #[error("cyclic struct reference {}", .0.join(" -> "))]
    CyclicStruct(Vec<String>),

    #[error("nested arrays are not supported")]
    NestedArray,

    #[error("duplicate member '{0}'")]
    DuplicateField(String),

    #[error("declaration has no members")]
    Empty,

    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("orientation is only allowed on array fields")]
    OrientationOnScalar,
}

/// Two distinct nodes resolved to the same generated identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("name collision on '{name}' between '{first}' and '{second}'")]
pub struct NameCollision {
    pub name: String,
    pub first: String,
    pub second: String,
}

/// Failures of the type mapper.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeMapError {
    #[error("target language has no mapping for {shape}")]
    UnsupportedType { shape: TypeShape },
}
