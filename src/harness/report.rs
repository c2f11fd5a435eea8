use crate::error::SessionError;
use crate::sink::CommitReport;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one scenario. Serializes to
/// `{scenario_name, outcome, error_kind?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario_name: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip)]
    pub error: Option<SessionError>,
    /// Index of the step whose resumption failed.
    #[serde(skip)]
    pub failed_step: Option<usize>,
    #[serde(skip)]
    pub commit: Option<CommitReport>,
    #[serde(skip)]
    pub expected: Option<Outcome>,
}

impl ScenarioReport {
    pub(crate) fn success(name: &str, commit: CommitReport, expected: Option<Outcome>) -> Self {
        Self {
            scenario_name: name.to_string(),
            outcome: Outcome::Success,
            error_kind: None,
            error: None,
            failed_step: None,
            commit: Some(commit),
            expected,
        }
    }

    pub(crate) fn failure(
        name: &str,
        error: SessionError,
        failed_step: Option<usize>,
        expected: Option<Outcome>,
    ) -> Self {
        Self {
            scenario_name: name.to_string(),
            outcome: Outcome::Failure,
            error_kind: Some(error.code_str().to_string()),
            error: Some(error),
            failed_step,
            commit: None,
            expected,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// True when the scenario carried no expectation or met it.
    pub fn matches_expectation(&self) -> bool {
        self.expected.is_none_or(|e| e == self.outcome)
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::Encode(e.to_string()))
    }
}
