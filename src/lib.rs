//! Deterministic replay of two bulk writes sharing one session.
//!
//! A bulk insert and a bulk update each pull their records from a stream
//! that is filled one value at a time. Both run as cooperative tasks that
//! only advance when the [`harness::Harness`] resumes them, so any
//! interleaving of record deliveries and stream endings can be replayed
//! exactly and its effect on the shared [`session::SessionHandle`] observed.

pub mod bulk;
pub mod catalog;
pub mod config;
pub mod error;
pub mod harness;
pub mod session;
pub mod sink;
pub mod stream;
pub mod task;

pub use crate::catalog::Entity;
pub use crate::catalog::types::{Record, Value};
pub use crate::config::SinkConfig;
pub use crate::error::{ErrorCode, SessionError};
pub use crate::harness::Harness;
pub use crate::harness::report::{Outcome, ScenarioReport};
pub use crate::harness::scenario::{Scenario, Step};
pub use crate::session::{BatchKind, BatchReport, SessionHandle};
pub use crate::sink::{CommitReport, DataSink};
pub use crate::stream::{Feed, FeedSlot, RecordStream};
pub use crate::task::{CooperativeTask, TaskState, TaskStatus};

/// Connects a sink from `config` and runs every built-in scenario against
/// the `test_model` table.
pub fn run_builtin(config: SinkConfig) -> Result<Vec<ScenarioReport>, SessionError> {
    let harness = Harness::new(DataSink::connect(config)?, Entity::test_model());
    let scenarios = harness::builtin::builtin_scenarios();
    harness.run_all(&scenarios)
}
