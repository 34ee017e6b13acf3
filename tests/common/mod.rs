// Common test fixtures and helpers

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use tablegen::prelude::*;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn schema_dir() -> PathBuf {
    fixtures_dir().join("schema")
}

/// Golden output for a unit, with line endings normalised to `\n`.
pub fn golden(name: &str) -> String {
    let path = fixtures_dir()
        .join("golden")
        .join(format!("{name}.generated.cs"));
    normalize(&fs::read_to_string(&path).unwrap())
}

pub fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// The sample batch: enum, shared struct and both sample tables.
pub fn sample_batch() -> SchemaBatch {
    SchemaBatch::load_dir(schema_dir()).unwrap()
}

pub fn compiler(profile: LanguageProfile, workers: usize) -> Compiler {
    let config = CompilerConfig::builder().workers(workers).build();
    Compiler::new(config, profile).unwrap()
}

/// Compile and collect into memory, panicking on any failure.
pub fn compile_all(compiler: &Compiler, batch: &SchemaBatch) -> MemorySink {
    let report = compiler.compile_batch(batch);
    for err in report.errors() {
        panic!("unexpected failure: {err}");
    }
    let mut sink = MemorySink::new();
    report.deliver(&mut sink).unwrap();
    sink
}

pub fn table_source(toml_text: &str) -> SchemaSource {
    toml::from_str(toml_text).unwrap()
}
