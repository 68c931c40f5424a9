//! The external query engine seam.
//!
//! The engine is a collaborator: it accepts a statement, hands back an
//! execution id, and reports the execution state on request. Everything
//! else in the crate talks to it through [`QueryEngine`].

#[cfg(feature = "http")]
mod athena;

#[cfg(feature = "http")]
pub use athena::AthenaHttpEngine;

use crate::core::ExecutionState;
use crate::errors::EngineError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One submission to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The statement text, verbatim.
    pub query: String,
    /// Where the engine writes results.
    pub output_location: String,
    /// Database context, when attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl QueryRequest {
    /// Creates a request without a database context.
    #[must_use]
    pub fn new(query: impl Into<String>, output_location: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            output_location: output_location.into(),
            database: None,
        }
    }

    /// Attaches a database context.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

/// The engine's answer to a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    /// Current state.
    pub state: ExecutionState,
    /// Reason for a `FAILED` or `CANCELLED` state, when the engine gives one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExecutionStatus {
    /// Creates a status without a reason.
    #[must_use]
    pub fn new(state: ExecutionState) -> Self {
        Self { state, reason: None }
    }

    /// Creates a `FAILED` status with a reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: ExecutionState::Failed,
            reason: Some(reason.into()),
        }
    }
}

/// A row of query results; `None` marks a SQL NULL.
pub type ResultRow = Vec<Option<String>>;

/// Trait for serverless SQL engines.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryEngine: Send + Sync + Debug {
    /// Submits a statement for asynchronous execution and returns its id.
    async fn submit(&self, request: &QueryRequest) -> Result<String, EngineError>;

    /// Fetches the current status of an execution.
    async fn poll_status(&self, execution_id: &str) -> Result<ExecutionStatus, EngineError>;

    /// Fetches up to `max_rows` data rows of a finished execution.
    ///
    /// Engines that cannot read results return no rows.
    async fn fetch_rows(
        &self,
        _execution_id: &str,
        _max_rows: usize,
    ) -> Result<Vec<ResultRow>, EngineError> {
        Ok(Vec::new())
    }
}
