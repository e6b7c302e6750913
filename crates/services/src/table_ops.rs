//! Declarative queries over [`Table`]s.
//!
//! Every function here takes the input by reference and returns a new table,
//! so repeated calls against a registry's stored tables are idempotent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shared::{RowRef, SchemaError, Table, Value};
use std::cmp::Ordering;
use std::fmt;

/// Reduction applied within each group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    Sum,
    Count,
    Mean,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "sum",
            AggregateOp::Count => "count",
            AggregateOp::Mean => "mean",
        }
    }

    fn needs_numbers(&self) -> bool {
        matches!(self, AggregateOp::Sum | AggregateOp::Mean)
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

/// Hashable identity of a group value. Missing values never form a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Number(u64),
    Text(String),
}

impl GroupKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            // -0.0 and 0.0 are the same group
            Value::Number(n) if *n == 0.0 => Some(GroupKey::Number(0f64.to_bits())),
            Value::Number(n) => Some(GroupKey::Number(n.to_bits())),
            Value::Text(s) => Some(GroupKey::Text(s.clone())),
            Value::Missing => None,
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    sum: f64,
    numbers: usize,
    present: usize,
}

impl Accumulator {
    fn push(&mut self, value: &Value) {
        match value {
            Value::Number(n) => {
                self.sum += n;
                self.numbers += 1;
                self.present += 1;
            }
            Value::Text(_) => self.present += 1,
            Value::Missing => {}
        }
    }

    fn finish(&self, op: AggregateOp) -> Value {
        match op {
            AggregateOp::Sum => Value::Number(self.sum),
            AggregateOp::Count => Value::Number(self.present as f64),
            AggregateOp::Mean if self.numbers == 0 => Value::Missing,
            AggregateOp::Mean => Value::Number(self.sum / self.numbers as f64),
        }
    }
}

/// Group rows by `group_by` and reduce `value_column` within each group.
///
/// Groups appear in first-seen order; rows with a missing group value are
/// dropped. `Sum` and `Mean` skip missing values and reject text.
pub fn aggregate(
    table: &Table,
    group_by: &str,
    value_column: &str,
    op: AggregateOp,
) -> Result<Table, SchemaError> {
    let g = table.require_column(group_by)?;
    let v = table.require_column(value_column)?;

    if op.needs_numbers()
        && table
            .rows()
            .any(|row| matches!(row.values()[v], Value::Text(_)))
    {
        return Err(SchemaError::incompatible_type(
            value_column,
            op.as_str(),
            table.columns(),
        ));
    }

    let mut groups: IndexMap<GroupKey, (Value, Accumulator)> = IndexMap::new();
    for row in table.rows() {
        let values = row.values();
        let Some(key) = GroupKey::of(&values[g]) else {
            continue;
        };
        groups
            .entry(key)
            .or_insert_with(|| (values[g].clone(), Accumulator::default()))
            .1
            .push(&values[v]);
    }

    Table::from_pairs(
        group_by,
        value_column,
        groups
            .into_values()
            .map(|(group, acc)| (group, acc.finish(op))),
    )
    .map_err(|_| SchemaError::duplicate_column(value_column, table.columns()))
}

/// The `n` rows with the largest (`Descending`) or smallest (`Ascending`)
/// values of `by_column`. Ties keep their original order; rows with a missing
/// value are left out.
pub fn top_n(
    table: &Table,
    by_column: &str,
    n: usize,
    order: SortOrder,
) -> Result<Table, SchemaError> {
    let idx = table.require_column(by_column)?;

    let mut ranked: Vec<(usize, f64)> = Vec::with_capacity(table.row_count());
    for row in table.rows() {
        match &row.values()[idx] {
            Value::Number(x) => ranked.push((row.index(), *x)),
            Value::Missing => {}
            Value::Text(_) => {
                return Err(SchemaError::incompatible_type(
                    by_column,
                    "rank",
                    table.columns(),
                ))
            }
        }
    }

    // sort_by is stable, so equal values stay in row order.
    ranked.sort_by(|a, b| order.apply(a.1.total_cmp(&b.1)));
    Ok(table.take_rows(ranked.into_iter().take(n).map(|(i, _)| i)))
}

/// Stable sort of all rows by one column. Numbers sort before text and
/// missing values always go last.
pub fn sort_by(table: &Table, column: &str, order: SortOrder) -> Result<Table, SchemaError> {
    let idx = table.require_column(column)?;

    let mut indices: Vec<usize> = (0..table.row_count()).collect();
    let rows: Vec<RowRef<'_>> = table.rows().collect();
    indices.sort_by(|&a, &b| {
        compare_values(&rows[a].values()[idx], &rows[b].values()[idx], order)
    });

    Ok(table.take_rows(indices))
}

fn compare_values(a: &Value, b: &Value, order: SortOrder) -> Ordering {
    match (a, b) {
        (Value::Missing, Value::Missing) => Ordering::Equal,
        (Value::Missing, _) => Ordering::Greater,
        (_, Value::Missing) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => order.apply(x.total_cmp(y)),
        (Value::Text(x), Value::Text(y)) => order.apply(x.cmp(y)),
        (Value::Number(_), Value::Text(_)) => order.apply(Ordering::Less),
        (Value::Text(_), Value::Number(_)) => order.apply(Ordering::Greater),
    }
}

/// New table with an extra column computed per row. Fails if the name is taken.
pub fn derive_column<F>(table: &Table, new_name: &str, f: F) -> Result<Table, SchemaError>
where
    F: FnMut(RowRef<'_>) -> Value,
{
    table.with_column(new_name, f)
}

/// New table with an existing column recomputed per row.
pub fn replace_column<F>(table: &Table, name: &str, f: F) -> Result<Table, SchemaError>
where
    F: FnMut(RowRef<'_>) -> Value,
{
    table.map_column(name, f)
}

/// Projection onto `columns`, in the order given.
pub fn select(table: &Table, columns: &[&str]) -> Result<Table, SchemaError> {
    table.project(columns)
}

/// The first `n` rows.
pub fn head(table: &Table, n: usize) -> Table {
    table.take_rows(0..n.min(table.row_count()))
}
