//! Destinations for generated units.
//!
//! The compiler never chooses file paths. A [`UnitSink`] receives each emitted
//! [`GeneratedUnit`] and decides where it goes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use strum::Display;

use crate::emit::GeneratedUnit;
use crate::error::{TableGenError, TableGenResult};

/// Receives generated units in batch order.
pub trait UnitSink {
    fn accept(&mut self, unit: &GeneratedUnit) -> TableGenResult<()>;
}

/// Collects unit text in memory, keyed by unit name.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    units: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.units
    }
}

impl UnitSink for MemorySink {
    fn accept(&mut self, unit: &GeneratedUnit) -> TableGenResult<()> {
        self.units
            .insert(unit.name().to_string(), unit.text().to_string());
        Ok(())
    }
}

/// Outcome of writing one unit to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum WriteStatus {
    Written,
    /// The file already held identical content
    Skipped,
}

/// Writes each unit to `<dir>/<name><suffix>`, touching the file only when its
/// content changed.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    suffix: String,
    statuses: Vec<(String, WriteStatus)>,
}

impl DirectorySink {
    /// The directory is created on the first write if it does not exist.
    pub fn new<P: Into<PathBuf>>(dir: P, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
            statuses: Vec::new(),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{}", self.suffix))
    }

    /// Write statuses in the order units were accepted.
    pub fn statuses(&self) -> &[(String, WriteStatus)] {
        &self.statuses
    }

    /// Write `text` to `path` unless the file already holds exactly that text.
    pub fn write_if_changed(path: &Path, text: &str) -> std::io::Result<WriteStatus> {
        match fs::read(path) {
            Ok(existing) if existing == text.as_bytes() => return Ok(WriteStatus::Skipped),
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(WriteStatus::Written)
    }
}

impl UnitSink for DirectorySink {
    fn accept(&mut self, unit: &GeneratedUnit) -> TableGenResult<()> {
        let path = self.path_for(unit.name());
        let status =
            Self::write_if_changed(&path, unit.text()).map_err(|source| TableGenError::SinkWrite {
                name: unit.name().to_string(),
                path: path.clone(),
                source,
            })?;

        debug!("{} {}", status, path.display());
        self.statuses.push((unit.name().to_string(), status));
        Ok(())
    }
}
