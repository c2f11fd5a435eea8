use crate::catalog::types::Record;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Value pushed into a record stream by whoever drives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feed {
    Record(Record),
    /// End-of-stream sentinel.
    End,
}

impl Feed {
    pub fn is_end(&self) -> bool {
        matches!(self, Feed::End)
    }
}

impl From<Record> for Feed {
    fn from(record: Record) -> Self {
        Feed::Record(record)
    }
}

/// Single-value handoff slot between a driver and a suspended stream.
///
/// A stream parked on an empty slot leaves its waker behind; `put` wakes
/// it, so the stream also works under an ordinary executor.
#[derive(Clone, Default)]
pub struct FeedSlot(Rc<RefCell<SlotInner>>);

#[derive(Default)]
struct SlotInner {
    feed: Option<Feed>,
    waker: Option<Waker>,
}

impl std::fmt::Debug for FeedSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("FeedSlot")
            .field("filled", &inner.feed.is_some())
            .field("parked", &inner.waker.is_some())
            .finish()
    }
}

impl FeedSlot {
    /// Leaves `feed` for the stream to pick up on its next poll. A value
    /// that was never picked up is replaced.
    pub fn put(&self, feed: Feed) {
        let waker = {
            let mut inner = self.0.borrow_mut();
            inner.feed = Some(feed);
            inner.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().feed.is_none()
    }

    fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Feed> {
        let mut inner = self.0.borrow_mut();
        match inner.feed.take() {
            Some(feed) => Poll::Ready(feed),
            None => {
                inner.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

/// Lazy, finite, non-restartable sequence of records fed from outside.
///
/// The first value is known up front. Every later `next()` suspends the
/// calling future until a value shows up in the shared [`FeedSlot`].
#[derive(Debug)]
pub struct RecordStream {
    first: Option<Feed>,
    slot: FeedSlot,
    exhausted: bool,
    yielded: usize,
}

impl RecordStream {
    pub fn new(first: Feed, slot: FeedSlot) -> Self {
        Self {
            first: Some(first),
            slot,
            exhausted: false,
            yielded: 0,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Next record, or `None` once the sentinel arrived. Stays `None` after
    /// that.
    pub async fn next(&mut self) -> Option<Record> {
        if self.exhausted {
            return None;
        }
        let feed = match self.first.take() {
            Some(feed) => feed,
            None => Handoff { slot: &self.slot }.await,
        };
        match feed {
            Feed::Record(record) => {
                self.yielded += 1;
                Some(record)
            }
            Feed::End => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Drains the stream, preserving delivery order.
    pub async fn collect(mut self) -> Vec<Record> {
        let mut records = Vec::new();
        while let Some(record) = self.next().await {
            records.push(record);
        }
        records
    }
}

/// Suspension point: pending until the slot holds a value.
struct Handoff<'a> {
    slot: &'a FeedSlot,
}

impl Future for Handoff<'_> {
    type Output = Feed;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Feed> {
        self.slot.poll_take(cx)
    }
}
