//! Dataset registry for marketing-analytics exports.
//!
//! - `dataset_registry`: directory scan, per-file failure collection, lookup
//! - `readers`: CSV and Excel parsing into [`shared::Table`]
//! - `table_ops`: aggregate, top-N, derive, sort, select, head
//! - `summary`: schema text and JSON record views
//! - `handle`: atomically swappable registry for reloads

pub mod dataset_registry;
pub mod handle;
pub mod readers;
pub mod summary;
pub mod table_ops;

#[cfg(test)]
mod test_support;

pub use dataset_registry::{load, load_with, LoadReport, Lookup, Registry};
pub use handle::RegistryHandle;
pub use summary::{records_json, registry_json, schema_summary};
pub use table_ops::{
    aggregate, derive_column, head, replace_column, select, sort_by, top_n, AggregateOp, SortOrder,
};
