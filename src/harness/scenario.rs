use crate::catalog::types::Record;
use crate::error::SessionError;
use crate::harness::report::Outcome;
use crate::session::BatchKind;
use crate::stream::Feed;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One resumption: hand `feed` to the `task` stream. A task's first step
/// starts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub task: BatchKind,
    pub feed: Feed,
}

/// Scripted interleaving of the insert and update tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expected: Option<Outcome>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            expected: None,
            steps: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn expect(mut self, outcome: Outcome) -> Self {
        self.expected = Some(outcome);
        self
    }

    pub fn send(mut self, task: BatchKind, record: Record) -> Self {
        self.steps.push(Step {
            task,
            feed: Feed::Record(record),
        });
        self
    }

    pub fn end(mut self, task: BatchKind) -> Self {
        self.steps.push(Step {
            task,
            feed: Feed::End,
        });
        self
    }

    /// Checks the script never resumes a finished task and leaves no task
    /// suspended at the end.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.name.trim().is_empty() {
            return Err(invalid("scenario name must not be empty"));
        }
        let mut ended = [false; 2];
        let mut started = [false; 2];
        for (idx, step) in self.steps.iter().enumerate() {
            let i = task_index(step.task);
            if ended[i] {
                return Err(invalid(&format!(
                    "{}: step {idx} feeds the {} task after its stream ended",
                    self.name, step.task
                )));
            }
            started[i] = true;
            ended[i] = step.feed.is_end();
        }
        for task in [BatchKind::Insert, BatchKind::Update] {
            let i = task_index(task);
            if started[i] && !ended[i] {
                return Err(invalid(&format!(
                    "{}: the {task} task is never sent the end-of-stream sentinel",
                    self.name
                )));
            }
        }
        if !started.iter().any(|s| *s) {
            return Err(invalid(&format!("{}: scenario has no steps", self.name)));
        }
        Ok(())
    }

    /// Tasks in the order the script starts them.
    pub fn start_order(&self) -> Vec<BatchKind> {
        let mut order = Vec::with_capacity(2);
        for step in &self.steps {
            if !order.contains(&step.task) {
                order.push(step.task);
            }
        }
        order
    }

    /// Tasks in the order their streams are ended.
    pub fn end_order(&self) -> Vec<BatchKind> {
        self.steps
            .iter()
            .filter(|s| s.feed.is_end())
            .map(|s| s.task)
            .collect()
    }

    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let scenario: Scenario =
            serde_json::from_str(json).map_err(|e| SessionError::Decode(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SessionError::Decode(format!("read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string_pretty(self).map_err(|e| SessionError::Encode(e.to_string()))
    }
}

fn task_index(task: BatchKind) -> usize {
    match task {
        BatchKind::Insert => 0,
        BatchKind::Update => 1,
    }
}

fn invalid(message: &str) -> SessionError {
    SessionError::InvalidScenario {
        message: message.to_string(),
    }
}
