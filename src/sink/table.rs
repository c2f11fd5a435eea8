use crate::catalog::types::Value;
use im::OrdMap;

/// Committed image of one table. Cloning is cheap, so readers take
/// snapshots instead of holding the sink lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableData {
    pub(crate) rows: OrdMap<i64, Value>,
    pub(crate) last_commit_seq: u64,
}

impl TableData {
    pub(crate) fn contains(&self, id: i64) -> bool {
        self.rows.contains_key(&id)
    }

    pub(crate) fn get(&self, id: i64) -> Option<&Value> {
        self.rows.get(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn put(&mut self, id: i64, value: Value, commit_seq: u64) {
        self.rows.insert(id, value);
        self.last_commit_seq = commit_seq;
    }
}
