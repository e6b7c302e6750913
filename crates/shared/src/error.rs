//! Error taxonomy for loading and querying datasets.

use serde::Serialize;
use std::path::PathBuf;

/// A query referenced a column the table does not have, or asked for an
/// operation the column's values cannot support.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("column `{column}` not found (available: {})", .columns.join(", "))]
    MissingColumn { column: String, columns: Vec<String> },

    #[error("column `{column}` already exists (columns: {})", .columns.join(", "))]
    DuplicateColumn { column: String, columns: Vec<String> },

    #[error("cannot {op} column `{column}`: it holds non-numeric values")]
    IncompatibleType {
        column: String,
        op: &'static str,
        columns: Vec<String>,
    },
}

impl SchemaError {
    pub fn missing_column(column: &str, columns: &[String]) -> Self {
        SchemaError::MissingColumn {
            column: column.to_string(),
            columns: columns.to_vec(),
        }
    }

    pub fn duplicate_column(column: &str, columns: &[String]) -> Self {
        SchemaError::DuplicateColumn {
            column: column.to_string(),
            columns: columns.to_vec(),
        }
    }

    pub fn incompatible_type(column: &str, op: &'static str, columns: &[String]) -> Self {
        SchemaError::IncompatibleType {
            column: column.to_string(),
            op,
            columns: columns.to_vec(),
        }
    }

    /// The offending column
    pub fn column(&self) -> &str {
        match self {
            SchemaError::MissingColumn { column, .. }
            | SchemaError::DuplicateColumn { column, .. }
            | SchemaError::IncompatibleType { column, .. } => column,
        }
    }

    /// The table's actual column set at the time of the failure
    pub fn columns(&self) -> &[String] {
        match self {
            SchemaError::MissingColumn { columns, .. }
            | SchemaError::DuplicateColumn { columns, .. }
            | SchemaError::IncompatibleType { columns, .. } => columns,
        }
    }
}

/// Shape errors raised while constructing a table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column name `{0}`")]
    DuplicateColumn(String),
}

/// One file that could not be turned into a table. Collected, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("failed to load {}: {reason}", .file.display())]
pub struct FileLoadError {
    pub file: PathBuf,
    pub reason: String,
}

/// The data directory itself could not be read
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read data directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
