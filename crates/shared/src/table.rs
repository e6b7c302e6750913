//! In-memory tables parsed from analytics exports.
//!
//! A [`Table`] has a fixed, ordered column set and rows that always carry one
//! value per column. Tables are immutable once built: every query operation in
//! `services` produces a new table instead of editing an existing one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{SchemaError, TableError};

/// A single cell
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON form used for record export (`null` for missing or non-finite numbers)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Missing => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Fixed-schema ordered collection of rows
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, rejecting duplicate column names and ragged rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(TableError::DuplicateColumn(name.clone()));
            }
        }

        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: index,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }

        Ok(Self { columns, rows })
    }

    /// A table with the given columns and no rows
    pub fn empty(columns: Vec<String>) -> Result<Self, TableError> {
        Self::new(columns, Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of `name`, or a [`SchemaError::MissingColumn`] naming the actual columns.
    pub fn require_column(&self, name: &str) -> Result<usize, SchemaError> {
        self.column_index(name)
            .ok_or_else(|| SchemaError::missing_column(name, &self.columns))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<RowRef<'_>> {
        self.rows.get(index).map(|values| RowRef {
            columns: &self.columns,
            values,
            index,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().enumerate().map(|(index, values)| RowRef {
            columns: &self.columns,
            values,
            index,
        })
    }

    /// All values of one column, top to bottom
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, SchemaError> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Row-oriented JSON objects, keyed by column name in column order
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }

    /// Two-column table of `(key, value)` pairs, e.g. the result of a group-by.
    pub fn from_pairs(
        key_column: &str,
        value_column: &str,
        pairs: impl IntoIterator<Item = (Value, Value)>,
    ) -> Result<Self, SchemaError> {
        let columns = vec![key_column.to_string(), value_column.to_string()];
        if key_column == value_column {
            return Err(SchemaError::duplicate_column(value_column, &columns));
        }
        let rows = pairs.into_iter().map(|(k, v)| vec![k, v]).collect();
        Ok(Self { columns, rows })
    }

    /// Same columns, only the rows at `indices` (in that order). Out-of-range
    /// indices are ignored.
    pub fn take_rows(&self, indices: impl IntoIterator<Item = usize>) -> Table {
        let rows = indices
            .into_iter()
            .filter_map(|i| self.rows.get(i).cloned())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Only the named columns, in the requested order.
    pub fn project(&self, names: &[&str]) -> Result<Table, SchemaError> {
        let mut indices = Vec::with_capacity(names.len());
        for (pos, name) in names.iter().enumerate() {
            if names[..pos].contains(name) {
                return Err(SchemaError::duplicate_column(name, &self.columns));
            }
            indices.push(self.require_column(name)?);
        }

        Ok(Table {
            columns: names.iter().map(|s| s.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// A copy with one more column, computed from each row.
    pub fn with_column<F>(&self, name: &str, mut f: F) -> Result<Table, SchemaError>
    where
        F: FnMut(RowRef<'_>) -> Value,
    {
        if self.has_column(name) {
            return Err(SchemaError::duplicate_column(name, &self.columns));
        }

        let rows = self
            .rows()
            .map(|row| {
                let mut values = row.values().to_vec();
                values.push(f(row));
                values
            })
            .collect();

        let mut columns = self.columns.clone();
        columns.push(name.to_string());
        Ok(Table { columns, rows })
    }

    /// A copy with an existing column recomputed from each row.
    pub fn map_column<F>(&self, name: &str, mut f: F) -> Result<Table, SchemaError>
    where
        F: FnMut(RowRef<'_>) -> Value,
    {
        let idx = self.require_column(name)?;
        let rows = self
            .rows()
            .map(|row| {
                let mut values = row.values().to_vec();
                values[idx] = f(row);
                values
            })
            .collect();

        Ok(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>) {
        (self.columns, self.rows)
    }
}

/// Borrowed view of one row, addressable by column name
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [Value],
    index: usize,
}

impl<'a> RowRef<'a> {
    /// Position of this row in its table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_number)
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_text)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}
