pub mod scope;
pub mod write_set;

use crate::catalog::Entity;
use crate::catalog::types::Record;
use crate::error::SessionError;
use crate::session::scope::{ResourceState, ScopeId, ScopeTree};
use crate::session::write_set::WriteSet;
use crate::sink::{CommitReport, DataSink, table_not_found};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    Insert,
    Update,
}

impl BatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchKind::Insert => "insert",
            BatchKind::Update => "update",
        }
    }
}

impl std::fmt::Display for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one batched submission did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub kind: BatchKind,
    pub entity: Entity,
    pub scope: ScopeId,
    pub records: usize,
    pub rows_matched: usize,
}

#[derive(Debug)]
struct SessionInner {
    id: u64,
    sink: DataSink,
    scopes: ScopeTree,
    staged: WriteSet,
}

/// One open transactional context against a [`DataSink`].
///
/// Handles are cheap clones of the same session and are meant for a single
/// thread: cooperative tasks share a handle without any locking.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Rc<RefCell<SessionInner>>,
}

impl SessionHandle {
    pub(crate) fn new(sink: DataSink, id: u64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SessionInner {
                id,
                sink,
                scopes: ScopeTree::default(),
                staged: WriteSet::default(),
            })),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Open only while a fresh submission could stage rows: the root and
    /// every scope above the current one must be open. A batch that
    /// finished under an already finalized parent leaves the session
    /// Finalized until it is closed.
    pub fn state(&self) -> ResourceState {
        let inner = self.inner.borrow();
        match inner.scopes.ensure_active(inner.scopes.current()) {
            Ok(()) => ResourceState::Open,
            Err(_) => ResourceState::Finalized,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ResourceState::Open
    }

    pub fn current_scope(&self) -> ScopeId {
        self.inner.borrow().scopes.current()
    }

    pub fn scope_state(&self, scope: ScopeId) -> ResourceState {
        self.inner.borrow().scopes.state(scope)
    }

    pub fn staged_rows(&self) -> usize {
        self.inner.borrow().staged.staged_rows()
    }

    /// Opens a nested batch scope under the session's current scope.
    pub fn begin_batch(&self) -> BatchScope {
        let scope = self.inner.borrow_mut().scopes.begin_nested();
        debug!(session = self.id(), scope = %scope, "batch scope opened");
        BatchScope {
            session: self.clone(),
            scope,
            done: false,
        }
    }

    pub fn submit_insert(
        &self,
        entity: &Entity,
        records: Vec<Record>,
    ) -> Result<BatchReport, SessionError> {
        self.begin_batch().submit(BatchKind::Insert, entity, records)
    }

    pub fn submit_update(
        &self,
        entity: &Entity,
        records: Vec<Record>,
    ) -> Result<BatchReport, SessionError> {
        self.begin_batch().submit(BatchKind::Update, entity, records)
    }

    /// Writes staged rows to the sink and finalizes the session.
    ///
    /// Fails without writing anything when the current scope chain holds a
    /// finalized scope; only `close` is left at that point.
    pub fn commit(&self) -> Result<CommitReport, SessionError> {
        let mut inner = self.inner.borrow_mut();
        let current = inner.scopes.current();
        if let Err(err) = inner.scopes.ensure_active(current) {
            warn!(session = inner.id, scope = %current, error = %err, "commit refused");
            return Err(err);
        }
        let stranded = inner.scopes.open_nested();
        if stranded > 0 {
            warn!(
                session = inner.id,
                stranded, "commit with batch scopes still open"
            );
        }
        let writes = std::mem::take(&mut inner.staged);
        inner.scopes.finalize_root();
        let report = inner.sink.apply(writes)?;
        info!(
            session = inner.id,
            commit_seq = report.commit_seq,
            inserted = report.rows_inserted,
            updated = report.rows_updated,
            "session committed"
        );
        Ok(report)
    }

    /// Finalizes the session, discarding anything staged. Closing a
    /// finalized session does nothing.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.scopes.state(ScopeId::ROOT) == ResourceState::Finalized {
            return;
        }
        let discarded = inner.staged.staged_rows();
        inner.staged = WriteSet::default();
        inner.scopes.finalize_root();
        if discarded > 0 {
            warn!(
                session = inner.id,
                discarded, "session closed without commit; staged rows rolled back"
            );
        } else {
            debug!(session = inner.id, "session closed");
        }
    }

    fn stage(
        &self,
        scope: ScopeId,
        kind: BatchKind,
        entity: &Entity,
        records: Vec<Record>,
    ) -> Result<BatchReport, SessionError> {
        let mut inner = self.inner.borrow_mut();
        if let Err(err) = inner.scopes.ensure_active(scope) {
            warn!(
                session = inner.id,
                scope = %scope,
                kind = %kind,
                error = %err,
                "bulk submission against finalized scope"
            );
            return Err(err);
        }
        let inner = &mut *inner;
        if !inner.sink.has_table(entity) {
            return Err(table_not_found(entity));
        }
        let submitted = records.len();
        let rows_matched = match kind {
            BatchKind::Insert => inner.staged.stage_insert(&inner.sink, entity, records)?,
            BatchKind::Update => inner.staged.stage_update(&inner.sink, entity, records)?,
        };
        debug!(
            session = inner.id,
            scope = %scope,
            kind = %kind,
            records = submitted,
            rows_matched,
            "bulk submission staged"
        );
        Ok(BatchReport {
            kind,
            entity: entity.clone(),
            scope,
            records: submitted,
            rows_matched,
        })
    }

    fn finish_scope(&self, scope: ScopeId) {
        self.inner.borrow_mut().scopes.finish(scope);
    }
}

/// A nested scope held by one in-flight batched write.
///
/// Submitting consumes the scope. Dropping it unsubmitted rolls it back.
#[derive(Debug)]
pub struct BatchScope {
    session: SessionHandle,
    scope: ScopeId,
    done: bool,
}

impl BatchScope {
    pub fn id(&self) -> ScopeId {
        self.scope
    }

    pub fn submit(
        mut self,
        kind: BatchKind,
        entity: &Entity,
        records: Vec<Record>,
    ) -> Result<BatchReport, SessionError> {
        let result = self.session.stage(self.scope, kind, entity, records);
        self.done = true;
        self.session.finish_scope(self.scope);
        result
    }
}

impl Drop for BatchScope {
    fn drop(&mut self) {
        if !self.done {
            debug!(scope = %self.scope, "batch scope abandoned; rolling back");
            self.session.finish_scope(self.scope);
        }
    }
}
