//! Submit-and-poll execution of single statements.

use super::context::database_context;
use crate::config::PollConfig;
use crate::core::{fingerprint, preview, ExecutionState, QueryOutcome, Statement, UNKNOWN_ERROR};
use crate::engine::{QueryEngine, QueryRequest, ResultRow};
use crate::errors::EngineError;
use crate::events::{self, EventSink, NoOpEventSink};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs one statement at a time against the query engine.
///
/// `execute` never returns an error: every way a statement can end is a
/// [`QueryOutcome`]. The runner does not retry.
#[derive(Debug, Clone)]
pub struct QueryRunner {
    engine: Arc<dyn QueryEngine>,
    output_location: String,
    poll: PollConfig,
    events: Arc<dyn EventSink>,
}

impl QueryRunner {
    /// Creates a runner writing results to `output_location`.
    #[must_use]
    pub fn new(engine: Arc<dyn QueryEngine>, output_location: impl Into<String>) -> Self {
        Self {
            engine,
            output_location: output_location.into(),
            poll: PollConfig::default(),
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the polling schedule.
    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the polling schedule.
    #[must_use]
    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    /// Returns the result output location.
    #[must_use]
    pub fn output_location(&self) -> &str {
        &self.output_location
    }

    /// Runs a catalog statement, labelled with its own label.
    pub async fn execute_statement(
        &self,
        statement: &Statement,
        database: Option<&str>,
    ) -> QueryOutcome {
        self.execute(&statement.text, database, statement.label.as_deref())
            .await
    }

    /// Submits `statement` and waits for a terminal outcome.
    ///
    /// The database context is attached unless the statement itself creates,
    /// drops or lists databases.
    pub async fn execute(
        &self,
        statement: &str,
        database: Option<&str>,
        label: Option<&str>,
    ) -> QueryOutcome {
        let label = label.unwrap_or("query");
        let digest = fingerprint(statement);

        if statement.trim().is_empty() {
            return self.errored(label, &digest, "Statement text is empty".to_string());
        }

        info!(label, statement_sha256 = %digest, "Running query");
        debug!(label, query = %preview(statement), "Query text");

        let mut request = QueryRequest::new(statement, self.output_location.clone());
        if let Some(db) = database_context(statement, database) {
            request = request.with_database(db);
        }

        let execution_id = match self.engine.submit(&request).await {
            Ok(id) => id,
            Err(err) => return self.errored(label, &digest, err.to_string()),
        };

        self.events.emit(
            events::QUERY_SUBMITTED,
            json!({
                "label": label,
                "execution_id": &execution_id,
                "statement_sha256": &digest,
                "database": &request.database,
            }),
        );

        self.wait_for_terminal(label, &digest, execution_id).await
    }

    /// Fetches up to `max_rows` result rows of a finished execution.
    pub async fn fetch_rows(
        &self,
        execution_id: &str,
        max_rows: usize,
    ) -> Result<Vec<ResultRow>, EngineError> {
        self.engine.fetch_rows(execution_id, max_rows).await
    }

    async fn wait_for_terminal(
        &self,
        label: &str,
        digest: &str,
        execution_id: String,
    ) -> QueryOutcome {
        // A zero ceiling would time out without ever asking the engine.
        let max_attempts = self.poll.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let status = match self.engine.poll_status(&execution_id).await {
                Ok(status) => status,
                Err(err) => return self.errored(label, digest, err.to_string()),
            };

            match status.state {
                ExecutionState::Succeeded => {
                    info!(label, execution_id = %execution_id, attempt, "Query succeeded");
                    self.events.emit(
                        events::QUERY_SUCCEEDED,
                        json!({"label": label, "execution_id": &execution_id, "polls": attempt}),
                    );
                    return QueryOutcome::Succeeded { execution_id };
                }
                ExecutionState::Failed | ExecutionState::Cancelled => {
                    let reason = status.reason.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                    warn!(
                        label,
                        execution_id = %execution_id,
                        state = %status.state,
                        reason = %reason,
                        "Query failed"
                    );
                    self.events.emit(
                        events::QUERY_FAILED,
                        json!({
                            "label": label,
                            "execution_id": &execution_id,
                            "state": status.state,
                            "reason": &reason,
                        }),
                    );
                    return QueryOutcome::Failed {
                        execution_id,
                        state: status.state,
                        reason,
                    };
                }
                ExecutionState::Queued | ExecutionState::Running => {}
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.poll.interval()).await;
            }
        }

        let attempts = max_attempts;
        warn!(label, execution_id = %execution_id, attempts, "Query timeout");
        self.events.emit(
            events::QUERY_TIMED_OUT,
            json!({"label": label, "execution_id": &execution_id, "polls": attempts}),
        );
        QueryOutcome::TimedOut {
            execution_id,
            attempts,
        }
    }

    fn errored(&self, label: &str, digest: &str, message: String) -> QueryOutcome {
        warn!(label, statement_sha256 = %digest, error = %message, "Query execution error");
        self.events.emit(
            events::QUERY_ERRORED,
            json!({"label": label, "statement_sha256": digest, "error": &message}),
        );
        QueryOutcome::Errored { message }
    }
}
