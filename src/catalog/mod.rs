pub mod types;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

pub const TEST_MODEL_TABLE: &str = "test_model";

/// Mapped entity a bulk operation targets: one table keyed by an integer
/// `id` with a single `value` column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    pub table_name: CompactString,
}

impl Entity {
    pub fn new(table_name: impl Into<CompactString>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    pub fn test_model() -> Self {
        Self::new(TEST_MODEL_TABLE)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.table_name)
    }
}
