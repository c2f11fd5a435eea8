mod table;

use crate::catalog::Entity;
use crate::catalog::types::Value;
use crate::config::SinkConfig;
use crate::error::SessionError;
use crate::session::SessionHandle;
use crate::session::write_set::WriteSet;
use crate::sink::table::TableData;
use im::OrdMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitReport {
    pub commit_seq: u64,
    pub rows_inserted: usize,
    pub rows_updated: usize,
}

#[derive(Debug, Default)]
struct SinkState {
    tables: BTreeMap<Entity, TableData>,
    commit_seq: u64,
    sessions_opened: u64,
}

/// In-memory stand-in for the database behind a session.
///
/// Clones share the same store. Sessions stage writes privately and only
/// touch the store on commit.
#[derive(Debug, Clone)]
pub struct DataSink {
    config: Arc<SinkConfig>,
    state: Arc<Mutex<SinkState>>,
}

impl DataSink {
    pub fn connect(config: SinkConfig) -> Result<Self, SessionError> {
        config.validate()?;
        info!(uri = %config.uri(), "data sink connected");
        Ok(Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(SinkState::default())),
        })
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Creates the entity's table. Existing tables are left untouched.
    pub fn create_table(&self, entity: &Entity) {
        let mut state = self.state.lock();
        if !state.tables.contains_key(entity) {
            debug!(table = %entity, "create table");
            state.tables.insert(entity.clone(), TableData::default());
        }
    }

    pub fn has_table(&self, entity: &Entity) -> bool {
        self.state.lock().tables.contains_key(entity)
    }

    pub fn rows(&self, entity: &Entity) -> Result<OrdMap<i64, Value>, SessionError> {
        self.with_table(entity, |table| table.rows.clone())
    }

    pub fn row(&self, entity: &Entity, id: i64) -> Result<Option<Value>, SessionError> {
        self.with_table(entity, |table| table.get(id).cloned())
    }

    pub fn row_count(&self, entity: &Entity) -> Result<usize, SessionError> {
        self.with_table(entity, TableData::len)
    }

    pub fn commit_seq(&self) -> u64 {
        self.state.lock().commit_seq
    }

    /// Sequence of the last commit that wrote to this table; 0 if none has.
    pub fn table_commit_seq(&self, entity: &Entity) -> Result<u64, SessionError> {
        self.with_table(entity, |table| table.last_commit_seq)
    }

    pub fn open_session(&self) -> SessionHandle {
        let id = {
            let mut state = self.state.lock();
            state.sessions_opened += 1;
            state.sessions_opened
        };
        debug!(session = id, "session opened");
        SessionHandle::new(self.clone(), id)
    }

    pub(crate) fn contains_row(&self, entity: &Entity, id: i64) -> Result<bool, SessionError> {
        self.with_table(entity, |table| table.contains(id))
    }

    /// Applies a session's staged rows as one commit.
    pub(crate) fn apply(&self, writes: WriteSet) -> Result<CommitReport, SessionError> {
        let mut state = self.state.lock();
        for entity in writes.tables() {
            if !state.tables.contains_key(entity) {
                return Err(table_not_found(entity));
            }
        }
        state.commit_seq += 1;
        let commit_seq = state.commit_seq;
        let mut report = CommitReport {
            commit_seq,
            ..CommitReport::default()
        };
        for (entity, staged) in writes.into_tables() {
            report.rows_inserted += staged.inserted;
            report.rows_updated += staged.updated();
            if let Some(table) = state.tables.get_mut(&entity) {
                for (id, value) in staged.rows {
                    table.put(id, value, commit_seq);
                }
            }
        }
        Ok(report)
    }

    fn with_table<T>(
        &self,
        entity: &Entity,
        f: impl FnOnce(&TableData) -> T,
    ) -> Result<T, SessionError> {
        let state = self.state.lock();
        state
            .tables
            .get(entity)
            .map(f)
            .ok_or_else(|| table_not_found(entity))
    }
}

pub(crate) fn table_not_found(entity: &Entity) -> SessionError {
    SessionError::TableNotFound {
        table: entity.table_name().to_string(),
    }
}
