//! Serializable store diagnostics.

use serde::{Deserialize, Serialize};

/// Size and wiring of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Table name, `(primary type, value type)`.
    pub table: String,
    /// Number of stored tuples.
    pub len: usize,
    /// Table deriving tuples into this one, if any.
    pub from_relation: Option<String>,
    /// Table this one derives tuples into, if any.
    pub with_relation: Option<String>,
}

/// Snapshot of every table in a store, sorted by table name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// The store's configured name.
    pub name: String,
    /// Sum of all table lengths.
    pub total_tuples: usize,
    /// Per-table details.
    pub tables: Vec<TableStats>,
}

impl StoreStats {
    /// Stats for the table with the given name, if present.
    pub fn table(&self, name: &str) -> Option<&TableStats> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> String {
        // Plain strings and integers only; serialization cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
