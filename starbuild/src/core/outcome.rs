//! Terminal outcome of one submitted statement.

use super::ExecutionState;
use serde::{Deserialize, Serialize};

/// Error text used when the engine fails a query without giving a reason.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Error text used when the polling ceiling is reached.
pub const TIMEOUT_ERROR: &str = "Query execution timeout";

/// The typed result of `QueryRunner::execute`.
///
/// Every variant except `Succeeded` is treated as a failure by callers;
/// the variants stay distinct so logs can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The engine reported `SUCCEEDED`.
    Succeeded {
        /// Engine-assigned execution id.
        execution_id: String,
    },
    /// The engine reported `FAILED` or `CANCELLED`.
    Failed {
        /// Engine-assigned execution id.
        execution_id: String,
        /// The terminal state observed.
        state: ExecutionState,
        /// Engine-provided reason.
        reason: String,
    },
    /// No terminal state was observed within the polling ceiling.
    TimedOut {
        /// Engine-assigned execution id.
        execution_id: String,
        /// Number of status polls performed.
        attempts: usize,
    },
    /// Submission or polling raised an error.
    Errored {
        /// Description of the error.
        message: String,
    },
}

impl QueryOutcome {
    /// Returns true if the statement succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns the execution id, when the statement was accepted.
    #[must_use]
    pub fn execution_id(&self) -> Option<&str> {
        match self {
            Self::Succeeded { execution_id }
            | Self::Failed { execution_id, .. }
            | Self::TimedOut { execution_id, .. } => Some(execution_id),
            Self::Errored { .. } => None,
        }
    }

    /// Returns the error text for failure outcomes.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { reason, .. } => Some(reason),
            Self::TimedOut { .. } => Some(TIMEOUT_ERROR),
            Self::Errored { message } => Some(message),
        }
    }

    /// Short status tag for logs.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "success",
            Self::Failed { .. } => "failed",
            Self::TimedOut { .. } => "timeout",
            Self::Errored { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_has_no_error() {
        let outcome = QueryOutcome::Succeeded {
            execution_id: "q-1".to_string(),
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.error(), None);
        assert_eq!(outcome.execution_id(), Some("q-1"));
    }

    #[test]
    fn test_timeout_error_text() {
        let outcome = QueryOutcome::TimedOut {
            execution_id: "q-2".to_string(),
            attempts: 150,
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.error(), Some(TIMEOUT_ERROR));
        assert_eq!(outcome.status(), "timeout");
    }

    #[test]
    fn test_errored_has_no_execution_id() {
        let outcome = QueryOutcome::Errored {
            message: "access denied".to_string(),
        };
        assert_eq!(outcome.execution_id(), None);
        assert_eq!(outcome.error(), Some("access denied"));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = QueryOutcome::Failed {
            execution_id: "q-3".to_string(),
            state: ExecutionState::Failed,
            reason: "SYNTAX_ERROR".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["state"], "FAILED");
    }
}
