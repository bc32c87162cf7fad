//! Error taxonomy for scenario execution.
//!
//! Step-level failures are caught per scenario and recorded as failing
//! results; they never abort the run. Session acquisition is the one fatal
//! path: without a browser session no scenario can execute.

use thiserror::Error;

/// Source type for engine-level failures, kept boxed so the runner never
/// depends on a concrete automation engine.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// A failure raised by a single scenario step.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("element {target} not found within {waited_ms}ms")]
    ElementNotFound { target: String, waited_ms: u64 },

    #[error("condition {condition} not satisfied within {waited_ms}ms")]
    Timeout { condition: String, waited_ms: u64 },

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("browser engine error: {0}")]
    Engine(#[source] EngineError),
}

/// Classification used by the report counts: assertion mismatches are
/// *failures*, everything else is an *error* (mirrors the failed/errored
/// split of the summary line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Assertion,
    Element,
    Timeout,
    Engine,
}

impl StepError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::Assertion(_) => FailureKind::Assertion,
            StepError::ElementNotFound { .. } => FailureKind::Element,
            StepError::Timeout { .. } => FailureKind::Timeout,
            StepError::Engine(_) => FailureKind::Engine,
        }
    }
}

impl FailureKind {
    /// True for the assertion class counted as a test failure rather than
    /// an execution error.
    pub fn is_assertion(&self) -> bool {
        matches!(self, FailureKind::Assertion)
    }
}

/// Fatal failure acquiring a browser session; aborts the whole run.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to create browser session at {endpoint}: {source}")]
    Acquire {
        endpoint: String,
        #[source]
        source: EngineError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_counts_as_failure_not_error() {
        let err = StepError::Assertion("URL mismatch".into());
        assert!(err.kind().is_assertion());

        let err = StepError::Timeout {
            condition: "urlContains(\"home\")".into(),
            waited_ms: 10_000,
        };
        assert!(!err.kind().is_assertion());
    }

    #[test]
    fn messages_carry_diagnostic_detail() {
        let err = StepError::ElementNotFound {
            target: "name=username".into(),
            waited_ms: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("name=username"));
        assert!(msg.contains("10000ms"));
    }
}
