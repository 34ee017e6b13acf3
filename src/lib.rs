//! # Tablegen
//!
//! A schema-to-code compiler for tabular game data. Authored tables (rows of
//! typed fields with nested structs, arrays, enum references and inline
//! documentation) are compiled into strongly-typed source code for a target
//! language.
//!
//! ## Features
//!
//! - **Nested structs**: inline struct fields become separately named types,
//!   `DESampleComplex_Rewards_Condition` style, declared before their users
//! - **Arrays**: of primitives, enums and structs, with row/column orientation
//!   kept as metadata
//! - **Shared types**: batch-level enums and shared structs, plus table-local
//!   struct templates
//! - **Language profiles**: target languages are data, not code; C# and Rust
//!   are built in and more can be loaded from TOML
//! - **Batch compilation**: schemas compile in parallel, fail independently and
//!   always produce byte-identical output for the same input
//!
//! ## Quick Start
//!
//! ```rust
//! use tablegen::prelude::*;
//!
//! let source: SchemaSource = toml::from_str(r#"
//!     [[tables]]
//!     name = "DEItem"
//!     doc = "Item table"
//!     fields = [
//!         { name = "id", type = "int" },
//!         { name = "tags", type = "[string" },
//!     ]
//! "#)?;
//!
//! let compiler = Compiler::new(CompilerConfig::default(), LanguageProfile::csharp())?;
//! let report = compiler.compile_batch(&SchemaBatch::from_sources([source]));
//! assert_eq!(report.summary(), "1 succeeded, 0 failed");
//!
//! let mut sink = MemorySink::new();
//! report.deliver(&mut sink)?;
//! assert!(sink.get("DEItem").unwrap().contains("public List<string> tags;"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod language;
pub mod mapper;
pub mod naming;
pub mod pipeline;
pub mod prelude;
pub mod schema;
pub mod sink;
pub mod source;
