use serde::Serialize;

use crate::diff::TextDiff;
use crate::formatter::FormatError;
use goldenfmt_fixture::FixturePath;

/// Lifecycle of a single case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    Pending,
    Running,
    Passed,
    Failed,
    Errored,
}

impl CaseState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CaseState::Passed | CaseState::Failed | CaseState::Errored)
    }

    pub fn can_advance_to(self, next: CaseState) -> bool {
        match self {
            CaseState::Pending => next == CaseState::Running,
            CaseState::Running => next.is_terminal(),
            _ => false,
        }
    }
}

/// The formatter produced the wrong text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseFailure {
    #[error("output differs from {expected_path} ({} line(s) changed)", .diff.changed_lines())]
    Mismatch {
        expected_path: FixturePath,
        diff: TextDiff,
    },
    #[error("formatting the formatted output changed it again")]
    NonIdempotent { diff: TextDiff },
    #[error("formatting the same input twice gave different output")]
    NonDeterministic { diff: TextDiff },
}

impl CaseFailure {
    pub fn diff(&self) -> &TextDiff {
        match self {
            CaseFailure::Mismatch { diff, .. }
            | CaseFailure::NonIdempotent { diff }
            | CaseFailure::NonDeterministic { diff } => diff,
        }
    }
}

/// The case could not be judged: a harness or formatter fault, never a
/// content mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseError {
    #[error("cannot read fixture {path}: {message}")]
    FixtureMissing { path: FixturePath, message: String },
    #[error("cannot read expected output {path}: {message}")]
    ExpectedMissing { path: FixturePath, message: String },
    #[error("formatter failure: {message}")]
    Format { message: String },
    #[error("case exceeded the {limit_ms}ms timeout")]
    Timeout { limit_ms: u64 },
    #[error("formatter panicked: {message}")]
    Panicked { message: String },
}

impl CaseError {
    /// Whether the fault lies with the formatter rather than the fixture tree.
    pub fn is_formatter_fault(&self) -> bool {
        matches!(
            self,
            CaseError::Format { .. } | CaseError::Timeout { .. } | CaseError::Panicked { .. }
        )
    }
}

impl From<FormatError> for CaseError {
    fn from(value: FormatError) -> Self {
        match value {
            FormatError::Timeout(limit) => CaseError::Timeout {
                limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            },
            other => CaseError::Format {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    Failed { failure: CaseFailure },
    Errored { error: CaseError },
}

impl TestOutcome {
    pub fn state(&self) -> CaseState {
        match self {
            TestOutcome::Passed => CaseState::Passed,
            TestOutcome::Failed { .. } => CaseState::Failed,
            TestOutcome::Errored { .. } => CaseState::Errored,
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn failure(&self) -> Option<&CaseFailure> {
        match self {
            TestOutcome::Failed { failure } => Some(failure),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CaseError> {
        match self {
            TestOutcome::Errored { error } => Some(error),
            _ => None,
        }
    }
}

impl From<CaseFailure> for TestOutcome {
    fn from(failure: CaseFailure) -> Self {
        TestOutcome::Failed { failure }
    }
}

impl From<CaseError> for TestOutcome {
    fn from(error: CaseError) -> Self {
        TestOutcome::Errored { error }
    }
}
