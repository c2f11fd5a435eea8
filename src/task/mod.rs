use crate::bulk::{bulk_insert_mappings, bulk_update_mappings};
use crate::catalog::Entity;
use crate::error::SessionError;
use crate::session::{BatchKind, BatchReport, SessionHandle};
use crate::stream::{Feed, FeedSlot, RecordStream};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use tracing::debug;

type BatchFuture = Pin<Box<dyn Future<Output = Result<BatchReport, SessionError>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Suspended,
    Finished,
}

/// Where a task stopped after `start` or `resume`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting inside `next()` for another record or the sentinel.
    Suspended,
    Finished(BatchReport),
}

enum Slot {
    Idle,
    Suspended(BatchFuture),
    Finished,
}

/// One bulk insert or bulk update that runs only when driven.
///
/// The task's batched write is an ordinary future. Polling it is the only
/// way it makes progress, so whoever calls `start`/`resume` fully decides
/// the interleaving with other tasks.
pub struct CooperativeTask {
    kind: BatchKind,
    session: SessionHandle,
    entity: Entity,
    feed: FeedSlot,
    slot: Slot,
}

impl CooperativeTask {
    pub fn new(kind: BatchKind, session: SessionHandle, entity: Entity) -> Self {
        Self {
            kind,
            session,
            entity,
            feed: FeedSlot::default(),
            slot: Slot::Idle,
        }
    }

    pub fn kind(&self) -> BatchKind {
        self.kind
    }

    pub fn state(&self) -> TaskState {
        match self.slot {
            Slot::Idle => TaskState::Idle,
            Slot::Suspended(_) => TaskState::Suspended,
            Slot::Finished => TaskState::Finished,
        }
    }

    /// Begins the batched write with `first` as its first stream value and
    /// runs it to its first suspension or to completion.
    ///
    /// # Panics
    ///
    /// If the task was already started.
    pub fn start(&mut self, first: Feed) -> Result<TaskStatus, SessionError> {
        assert!(
            matches!(self.slot, Slot::Idle),
            "{} task started twice",
            self.kind
        );
        debug!(task = %self.kind, end = first.is_end(), "task start");
        let stream = RecordStream::new(first, self.feed.clone());
        let session = self.session.clone();
        let entity = self.entity.clone();
        let future: BatchFuture = match self.kind {
            BatchKind::Insert => Box::pin(bulk_insert_mappings(session, entity, stream)),
            BatchKind::Update => Box::pin(bulk_update_mappings(session, entity, stream)),
        };
        self.drive(future)
    }

    /// Hands `feed` to the suspended `next()` and runs until the next
    /// suspension or completion. Errors from the batched write surface here.
    ///
    /// # Panics
    ///
    /// If the task is not suspended.
    pub fn resume(&mut self, feed: Feed) -> Result<TaskStatus, SessionError> {
        let Slot::Suspended(future) = std::mem::replace(&mut self.slot, Slot::Finished) else {
            panic!("{} task resumed while not suspended", self.kind);
        };
        debug!(task = %self.kind, end = feed.is_end(), "task resume");
        self.feed.put(feed);
        self.drive(future)
    }

    fn drive(&mut self, mut future: BatchFuture) -> Result<TaskStatus, SessionError> {
        let mut cx = Context::from_waker(Waker::noop());
        match future.as_mut().poll(&mut cx) {
            Poll::Pending => {
                self.slot = Slot::Suspended(future);
                Ok(TaskStatus::Suspended)
            }
            Poll::Ready(result) => {
                self.slot = Slot::Finished;
                debug!(task = %self.kind, ok = result.is_ok(), "task finished");
                result.map(TaskStatus::Finished)
            }
        }
    }
}

impl std::fmt::Debug for CooperativeTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CooperativeTask")
            .field("kind", &self.kind)
            .field("entity", &self.entity)
            .field("state", &self.state())
            .finish()
    }
}
