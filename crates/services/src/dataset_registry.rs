//! Dataset registry: every readable export in a directory, addressable by name.
//!
//! The registry is built once by [`load`] / [`load_with`] and never changes
//! afterwards. A file that fails to parse is reported in the [`LoadReport`]
//! and left out; it never stops the rest of the directory from loading.

use serde::Serialize;
use shared::settings::RegistryConfig;
use shared::{FileLoadError, LoadError, Table};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::readers::{self, FileKind};

/// Result of looking a dataset up by name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// No dataset with that name
    Absent,
    /// Known dataset with zero rows; the column set is still available
    Empty(&'a Table),
    /// Known dataset with at least one row
    Present(&'a Table),
}

impl<'a> Lookup<'a> {
    fn from_table(table: Option<&'a Table>) -> Self {
        match table {
            None => Lookup::Absent,
            Some(t) if t.is_empty() => Lookup::Empty(t),
            Some(t) => Lookup::Present(t),
        }
    }

    /// The table, only when it has rows
    pub fn table(&self) -> Option<&'a Table> {
        match self {
            Lookup::Present(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Lookup::Empty(_))
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Lookup::Present(_))
    }
}

/// What happened to each file during a load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Registered dataset names, in load order
    pub loaded: Vec<String>,
    /// Files ignored because of their extension
    pub skipped: Vec<PathBuf>,
    /// Files that could not be parsed
    pub failures: Vec<FileLoadError>,
    /// Names that a later file replaced
    pub shadowed: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} datasets loaded, {} files skipped, {} failed",
            self.loaded.len(),
            self.skipped.len(),
            self.failures.len()
        )
    }
}

/// Immutable name → table mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    tables: BTreeMap<String, Table>,
}

impl Registry {
    /// Build a registry from already-parsed tables. Later entries win on name clashes.
    pub fn from_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = (S, Table)>,
        S: Into<String>,
    {
        Self {
            tables: tables.into_iter().map(|(n, t)| (n.into(), t)).collect(),
        }
    }

    /// Exact-name lookup. Never fails.
    pub fn get(&self, name: &str) -> Lookup<'_> {
        Lookup::from_table(self.tables.get(name))
    }

    /// First candidate that has rows; otherwise the first empty one; otherwise absent.
    pub fn get_first(&self, names: &[&str]) -> Lookup<'_> {
        let mut fallback = Lookup::Absent;
        for name in names {
            match self.get(name) {
                hit @ Lookup::Present(_) => return hit,
                empty @ Lookup::Empty(_) if fallback.is_absent() => fallback = empty,
                _ => {}
            }
        }
        fallback
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Load every supported file in `directory` with default settings.
pub fn load(directory: impl AsRef<Path>) -> Result<(Registry, LoadReport), LoadError> {
    load_with(&RegistryConfig::new(directory.as_ref()))
}

/// Load every supported file in `cfg.data_dir` (non-recursive).
pub fn load_with(cfg: &RegistryConfig) -> Result<(Registry, LoadReport), LoadError> {
    let dir = &cfg.data_dir;
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Directory {
        path: dir.clone(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    // Name order makes collisions deterministic.
    files.sort();

    let mut tables: BTreeMap<String, Table> = BTreeMap::new();
    let mut report = LoadReport::default();

    for path in files {
        let Some(kind) = FileKind::from_path(&path) else {
            debug!(file = %path.display(), "skipping unsupported file");
            report.skipped.push(path);
            continue;
        };

        match readers::read_file(&path, kind, cfg) {
            Ok(datasets) => {
                for (name, table) in datasets {
                    debug!(
                        dataset = %name,
                        rows = table.row_count(),
                        columns = table.columns().len(),
                        "loaded dataset"
                    );
                    if tables.insert(name.clone(), table).is_some() {
                        warn!(
                            dataset = %name,
                            file = %path.display(),
                            "dataset name reused, keeping the later file"
                        );
                        report.loaded.retain(|n| n != &name);
                        report.shadowed.push(name.clone());
                    }
                    report.loaded.push(name);
                }
            }
            Err(err) => {
                let reason = format!("{:#}", err);
                warn!(file = %path.display(), error = %reason, "failed to load file");
                report.failures.push(FileLoadError { file: path, reason });
            }
        }
    }

    info!(dir = %dir.display(), "{}", report.summary());
    Ok((Registry { tables }, report))
}
