//! Schema source loading
//!
//! Reads [`SchemaSource`] trees from TOML strings, files or directories.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{TableGenError, TableGenResult};
use crate::source::types::SchemaSource;

/// Parse a schema source from a TOML string
pub fn parse_schema_source_from_str(content: &str) -> TableGenResult<SchemaSource> {
    parse_with_origin(content, "<string>")
}

/// Parse a schema source from a TOML file
pub fn parse_schema_source<P: AsRef<Path>>(path: P) -> TableGenResult<SchemaSource> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| TableGenError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;

    parse_with_origin(&content, &path.display().to_string())
}

/// Load every `*.toml` schema source in a directory, ordered by file name.
///
/// Editor lock files (names starting with `~` or `.`) are ignored.
pub fn load_schema_dir<P: AsRef<Path>>(dir: P) -> TableGenResult<Vec<(PathBuf, SchemaSource)>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| TableGenError::SourceRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('~') || name.starts_with('.'));

        if path.is_file() && is_toml && !hidden {
            paths.push(path);
        }
    }
    paths.sort();

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        debug!("Loading schema source {}", path.display());
        let source = parse_schema_source(&path)?;
        results.push((path, source));
    }

    Ok(results)
}

fn parse_with_origin(content: &str, origin: &str) -> TableGenResult<SchemaSource> {
    toml::from_str(content).map_err(|e| TableGenError::SourceParse {
        origin: origin.to_string(),
        message: e.to_string(),
    })
}
