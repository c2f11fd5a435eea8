use crate::catalog::Entity;
use crate::catalog::types::{Record, Value};
use crate::error::SessionError;
use crate::sink::DataSink;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedTable {
    /// Row images this session will write on commit.
    pub rows: BTreeMap<i64, Value>,
    pub inserted: usize,
    updated: BTreeSet<i64>,
}

impl StagedTable {
    /// Distinct rows touched by updates, however many times each was hit.
    pub fn updated(&self) -> usize {
        self.updated.len()
    }
}

/// Rows staged by a session, overlaying the sink's committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSet {
    tables: BTreeMap<Entity, StagedTable>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|t| t.rows.is_empty())
    }

    pub fn staged_rows(&self) -> usize {
        self.tables.values().map(|t| t.rows.len()).sum()
    }

    pub fn table(&self, entity: &Entity) -> Option<&StagedTable> {
        self.tables.get(entity)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Entity> {
        self.tables.keys()
    }

    pub fn into_tables(self) -> impl Iterator<Item = (Entity, StagedTable)> {
        self.tables.into_iter()
    }

    /// Stages a whole insert batch or nothing.
    pub(crate) fn stage_insert(
        &mut self,
        sink: &DataSink,
        entity: &Entity,
        records: Vec<Record>,
    ) -> Result<usize, SessionError> {
        let mut seen = BTreeSet::new();
        for record in &records {
            let staged = self
                .tables
                .get(entity)
                .is_some_and(|t| t.rows.contains_key(&record.id));
            if !seen.insert(record.id) || staged || sink.contains_row(entity, record.id)? {
                return Err(SessionError::DuplicatePrimaryKey {
                    table: entity.table_name().to_string(),
                    key: record.id,
                });
            }
        }
        let table = self.tables.entry(entity.clone()).or_default();
        let count = records.len();
        for record in records {
            table.rows.insert(record.id, record.value);
        }
        table.inserted += count;
        Ok(count)
    }

    /// Applies updates in order; ids matching no row are skipped and a
    /// repeated id keeps its last value. Returns the number of distinct
    /// rows matched.
    pub(crate) fn stage_update(
        &mut self,
        sink: &DataSink,
        entity: &Entity,
        records: Vec<Record>,
    ) -> Result<usize, SessionError> {
        let mut matched = BTreeMap::new();
        for record in records {
            let staged = self
                .tables
                .get(entity)
                .is_some_and(|t| t.rows.contains_key(&record.id));
            if staged || sink.contains_row(entity, record.id)? {
                matched.insert(record.id, record.value);
            }
        }
        let table = self.tables.entry(entity.clone()).or_default();
        let count = matched.len();
        for (id, value) in matched {
            table.rows.insert(id, value);
            table.updated.insert(id);
        }
        Ok(count)
    }
}
