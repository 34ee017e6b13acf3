//! Configuration for the compiler and for tablegen projects.
//!
//! [`CompilerConfig`] tunes a batch run and is built with `typed-builder`.
//! [`ProjectConfig`] is the on-disk TOML file the `tablegen` binary reads.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::{ConfigError, TableGenError, TableGenResult};
use crate::language::LanguageProfile;

/// Batch execution settings.
///
/// # Examples
///
/// ```
/// use tablegen::config::CompilerConfig;
///
/// // Use every available core
/// let config = CompilerConfig::builder().build();
/// assert!(config.workers >= 1);
///
/// // Compile inline on the calling thread
/// let config = CompilerConfig::builder().workers(1).build();
/// assert_eq!(config.workers, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
#[builder(doc)]
pub struct CompilerConfig {
    /// Number of worker threads per phase. 1 runs every schema inline.
    #[builder(default = default_workers())]
    pub workers: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// A tablegen project file.
///
/// ```toml
/// schema_dir = "schema"
/// code_dir = "generated"
/// language = "csharp"
/// file_suffix = ".generated.cs"
/// ```
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProjectConfig {
    /// Directory of `*.toml` schema sources
    pub schema_dir: PathBuf,
    /// Directory generated units are written into
    pub code_dir: PathBuf,
    /// Built-in profile name or path to a profile TOML file
    #[serde(default = "default_language")]
    pub language: String,
    /// Appended to each unit name to form its file name
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

fn default_language() -> String {
    "csharp".to_string()
}

fn default_file_suffix() -> String {
    ".generated.cs".to_string()
}

impl ProjectConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(schema_dir: P, code_dir: Q) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            code_dir: code_dir.into(),
            language: default_language(),
            file_suffix: default_file_suffix(),
            base_dir: None,
        }
    }

    /// Parse a project file from a TOML string.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a project file. Relative paths inside it are resolved against the
    /// file's directory.
    pub fn load<P: AsRef<Path>>(path: P) -> TableGenResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TableGenError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_toml_str(&content, &path.display().to_string())?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.resolve(&self.schema_dir)
    }

    pub fn code_dir(&self) -> PathBuf {
        self.resolve(&self.code_dir)
    }

    /// Resolve and validate the configured language profile.
    pub fn language_profile(&self) -> TableGenResult<LanguageProfile> {
        LanguageProfile::resolve(&self.language, self.base_dir.as_deref())
    }
}
