//! Error types for the warehouse build.
//!
//! Engine-level failures (`EngineError`) surface inside query outcomes;
//! a failed create statement becomes a `StageAbortError`, which ends the run.
//! Both reach callers wrapped in [`WarehouseError`].

use std::collections::HashMap;
use thiserror::Error;

/// The main error type for starbuild operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// The requested stage selector is not recognized.
    #[error("Unknown stage: '{0}' (expected one of: views, dims, facts, validate, all)")]
    UnknownStage(String),

    /// A statement source could not find the requested statement.
    #[error("SQL file not found: {path}")]
    StatementNotFound {
        /// Path or key that was looked up.
        path: String,
    },

    /// The stage catalog is inconsistent.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An invocation payload was not a JSON object.
    #[error("Invalid event: expected an object such as {{\"step\": \"dims\"}}, got {0}")]
    InvalidEvent(String),

    /// The query engine could not be reached or set up.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// A required statement failed and the stage was aborted.
    #[error("{0}")]
    StageAbort(#[from] StageAbortError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for WarehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Errors raised while talking to the query engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The engine rejected or could not accept the statement.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Fetching the execution status failed.
    #[error("Polling failed for execution {execution_id}: {message}")]
    Polling {
        /// The execution being polled.
        execution_id: String,
        /// The underlying message.
        message: String,
    },

    /// The engine endpoint answered with a non-success HTTP status.
    #[error("Engine returned HTTP {status}: {body}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The response body.
        body: String,
    },

    /// The engine response could not be interpreted.
    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    /// The request never reached the engine.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl EngineError {
    /// Creates a submission error.
    #[must_use]
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission(message.into())
    }

    /// Creates a polling error.
    #[must_use]
    pub fn polling(execution_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Polling {
            execution_id: execution_id.into(),
            message: message.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        match self {
            Self::Submission(_) => {
                map.insert("type".to_string(), serde_json::json!("SubmissionError"));
            }
            Self::Polling { execution_id, .. } => {
                map.insert("type".to_string(), serde_json::json!("PollingError"));
                map.insert("execution_id".to_string(), serde_json::json!(execution_id));
            }
            Self::Http { status, .. } => {
                map.insert("type".to_string(), serde_json::json!("HttpError"));
                map.insert("status".to_string(), serde_json::json!(status));
            }
            Self::MalformedResponse(_) => {
                map.insert("type".to_string(), serde_json::json!("MalformedResponse"));
            }
            Self::Transport(_) => {
                map.insert("type".to_string(), serde_json::json!("TransportError"));
            }
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Raised when a create statement in a stage does not succeed.
#[derive(Debug, Clone, Error)]
#[error("Failed to create {artifact}: {message}")]
pub struct StageAbortError {
    /// The stage that was aborted.
    pub stage: String,
    /// The artifact whose creation failed.
    pub artifact: String,
    /// The engine error text, verbatim.
    pub message: String,
}

impl StageAbortError {
    /// Creates a new stage abort error.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        artifact: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("stage".to_string(), serde_json::json!(self.stage));
        map.insert("artifact".to_string(), serde_json::json!(self.artifact));
        map.insert("message".to_string(), serde_json::json!(self.message));
        map
    }
}
