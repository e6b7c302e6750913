pub mod error;
pub mod table;

pub use error::{FileLoadError, LoadError, SchemaError, TableError};
pub use table::{RowRef, Table, Value};

pub mod settings {
    use anyhow::{Context, Result};
    use serde::{Deserialize, Serialize};
    use std::path::{Path, PathBuf};

    /// Tokens read as missing cells in text exports
    pub const DEFAULT_MISSING_MARKERS: &[&str] =
        &["NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

    fn default_data_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_missing_markers() -> Vec<String> {
        DEFAULT_MISSING_MARKERS.iter().map(|s| s.to_string()).collect()
    }

    /// Which sheets of a workbook become datasets
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SheetPolicy {
        /// First sheet only, registered under the file stem
        #[default]
        FirstSheet,
        /// Every sheet, registered under its sheet name
        AllSheets,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RegistryConfig {
        #[serde(default = "default_data_dir")]
        pub data_dir: PathBuf,
        #[serde(default)]
        pub sheet_policy: SheetPolicy,
        #[serde(default = "default_missing_markers")]
        pub missing_markers: Vec<String>,
    }

    impl Default for RegistryConfig {
        fn default() -> Self {
            Self {
                data_dir: default_data_dir(),
                sheet_policy: SheetPolicy::default(),
                missing_markers: default_missing_markers(),
            }
        }
    }

    impl RegistryConfig {
        pub fn new(data_dir: impl Into<PathBuf>) -> Self {
            Self {
                data_dir: data_dir.into(),
                ..Self::default()
            }
        }

        pub fn with_sheet_policy(mut self, policy: SheetPolicy) -> Self {
            self.sheet_policy = policy;
            self
        }

        /// Read a JSON config file; absent keys fall back to defaults.
        pub fn from_json_file(path: &Path) -> Result<Self> {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display()))
        }

        pub fn is_missing_marker(&self, raw: &str) -> bool {
            self.missing_markers.iter().any(|m| m == raw)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tempfile::tempdir;

        #[test]
        fn partial_json_keeps_defaults() {
            let tmp = tempdir().unwrap();
            let path = tmp.path().join("dashboard.json");
            std::fs::write(&path, r#"{"sheet_policy": "all_sheets"}"#).unwrap();

            let cfg = RegistryConfig::from_json_file(&path).unwrap();
            assert_eq!(cfg.sheet_policy, SheetPolicy::AllSheets);
            assert_eq!(cfg.data_dir, PathBuf::from("."));
            assert!(cfg.is_missing_marker("N/A"));
            assert!(!cfg.is_missing_marker("0"));
        }

        #[test]
        fn malformed_json_is_an_error() {
            let tmp = tempdir().unwrap();
            let path = tmp.path().join("dashboard.json");
            std::fs::write(&path, "{ not json").unwrap();
            assert!(RegistryConfig::from_json_file(&path).is_err());
        }
    }
}
