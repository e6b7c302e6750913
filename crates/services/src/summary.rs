//! Text and JSON views of loaded datasets, for prompt builders and logs.

use shared::Table;

use crate::dataset_registry::Registry;

/// One line per dataset: `• name: columns = [..] (n rows)`
pub fn schema_summary(registry: &Registry) -> String {
    registry
        .iter()
        .map(|(name, table)| {
            format!(
                "• {}: columns = [{}] ({} rows)",
                name,
                table.columns().join(", "),
                table.row_count()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Row-oriented JSON array of the table
pub fn records_json(table: &Table) -> serde_json::Result<String> {
    serde_json::to_string(&table.to_records())
}

/// All datasets as `{ name: [records...] }`
pub fn registry_json(registry: &Registry) -> serde_json::Result<String> {
    let map: serde_json::Map<String, serde_json::Value> = registry
        .iter()
        .map(|(name, table)| {
            let rows = table
                .to_records()
                .into_iter()
                .map(serde_json::Value::Object)
                .collect();
            (name.to_string(), serde_json::Value::Array(rows))
        })
        .collect();
    serde_json::to_string(&map)
}
