pub mod builtin;
pub mod report;
pub mod scenario;

use crate::catalog::Entity;
use crate::error::SessionError;
use crate::harness::report::ScenarioReport;
use crate::harness::scenario::Scenario;
use crate::session::{BatchKind, SessionHandle};
use crate::sink::DataSink;
use crate::task::{CooperativeTask, TaskState, TaskStatus};
use tracing::{debug, info, warn};

/// Closes the session on every exit path.
struct SessionGuard(SessionHandle);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Replays scripted interleavings of one insert task and one update task
/// that share a session, and reports how each run ended.
#[derive(Debug, Clone)]
pub struct Harness {
    sink: DataSink,
    entity: Entity,
}

impl Harness {
    /// Uses `entity` on `sink`, creating its table if needed.
    pub fn new(sink: DataSink, entity: Entity) -> Self {
        sink.create_table(&entity);
        Self { sink, entity }
    }

    pub fn sink(&self) -> &DataSink {
        &self.sink
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Runs one scenario in its own session. A rejected script is an error;
    /// everything that happens while replaying it lands in the report.
    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioReport, SessionError> {
        scenario.validate()?;
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "scenario start");

        let guard = SessionGuard(self.sink.open_session());
        let session = &guard.0;
        let mut tasks = [
            CooperativeTask::new(BatchKind::Insert, session.clone(), self.entity.clone()),
            CooperativeTask::new(BatchKind::Update, session.clone(), self.entity.clone()),
        ];

        for (idx, step) in scenario.steps.iter().enumerate() {
            let task = match step.task {
                BatchKind::Insert => &mut tasks[0],
                BatchKind::Update => &mut tasks[1],
            };
            let result = match task.state() {
                TaskState::Idle => task.start(step.feed.clone()),
                TaskState::Suspended => task.resume(step.feed.clone()),
                TaskState::Finished => {
                    return Err(SessionError::InvalidScenario {
                        message: format!("step {idx} resumes the finished {} task", step.task),
                    });
                }
            };
            match result {
                Ok(TaskStatus::Suspended) => {
                    debug!(step = idx, task = %step.task, "task suspended");
                }
                Ok(TaskStatus::Finished(batch)) => {
                    debug!(
                        step = idx,
                        task = %step.task,
                        records = batch.records,
                        rows_matched = batch.rows_matched,
                        "task finished"
                    );
                }
                Err(err) => {
                    warn!(scenario = %scenario.name, step = idx, task = %step.task, error = %err, "scenario failed");
                    abandon_suspended(&tasks);
                    return Ok(ScenarioReport::failure(
                        &scenario.name,
                        err,
                        Some(idx),
                        scenario.expected,
                    ));
                }
            }
        }

        let report = match session.commit() {
            Ok(commit) => ScenarioReport::success(&scenario.name, commit, scenario.expected),
            Err(err) => {
                warn!(scenario = %scenario.name, error = %err, "commit failed");
                ScenarioReport::failure(&scenario.name, err, None, scenario.expected)
            }
        };
        info!(scenario = %scenario.name, outcome = %report.outcome, "scenario end");
        Ok(report)
    }

    pub fn run_all<'a>(
        &self,
        scenarios: impl IntoIterator<Item = &'a Scenario>,
    ) -> Result<Vec<ScenarioReport>, SessionError> {
        scenarios.into_iter().map(|s| self.run(s)).collect()
    }
}

fn abandon_suspended(tasks: &[CooperativeTask]) {
    for task in tasks {
        if task.state() == TaskState::Suspended {
            warn!(task = %task.kind(), "dropping task still suspended mid-stream");
        }
    }
}
