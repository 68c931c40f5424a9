//! In-memory query engine for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::core::ExecutionState;
use crate::engine::{ExecutionStatus, QueryEngine, QueryRequest, ResultRow};
use crate::errors::EngineError;

/// How a scripted execution behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedBehavior {
    /// Succeed on the first poll.
    Succeed,
    /// Report `RUNNING` for the given number of polls, then succeed.
    RunningPolls(usize),
    /// Report `FAILED` with the given reason.
    Fail(String),
    /// Report `CANCELLED` without a reason.
    Cancel,
    /// Report `RUNNING` forever.
    Hang,
    /// Reject the submission with the given message.
    Reject(String),
    /// Accept the submission, then fail every poll with the given message.
    BreakPolling(String),
    /// Succeed and serve these rows from `fetch_rows`.
    Rows(Vec<ResultRow>),
}

#[derive(Debug)]
struct Execution {
    request: QueryRequest,
    behavior: ScriptedBehavior,
    polls: usize,
}

#[derive(Debug, Default)]
struct EngineState {
    submitted: Vec<QueryRequest>,
    order: Vec<String>,
    executions: HashMap<String, Execution>,
    next_id: usize,
}

/// A query engine whose behavior is scripted by substring rules.
///
/// The first rule whose pattern is contained in the submitted statement
/// decides the behavior; statements matching no rule succeed immediately.
/// Every submission attempt is recorded, including rejected ones.
#[derive(Debug, Default)]
pub struct ScriptedQueryEngine {
    rules: Vec<(String, ScriptedBehavior)>,
    state: Mutex<EngineState>,
}

impl ScriptedQueryEngine {
    /// Creates an engine where every statement succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    #[must_use]
    pub fn when(mut self, pattern: impl Into<String>, behavior: ScriptedBehavior) -> Self {
        self.rules.push((pattern.into(), behavior));
        self
    }

    /// Statements containing `pattern` fail with `reason`.
    #[must_use]
    pub fn fail_when(self, pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        self.when(pattern, ScriptedBehavior::Fail(reason.into()))
    }

    /// Statements containing `pattern` are cancelled.
    #[must_use]
    pub fn cancel_when(self, pattern: impl Into<String>) -> Self {
        self.when(pattern, ScriptedBehavior::Cancel)
    }

    /// Statements containing `pattern` never finish.
    #[must_use]
    pub fn hang_when(self, pattern: impl Into<String>) -> Self {
        self.when(pattern, ScriptedBehavior::Hang)
    }

    /// Submissions containing `pattern` are rejected.
    #[must_use]
    pub fn reject_when(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.when(pattern, ScriptedBehavior::Reject(message.into()))
    }

    /// Polls for statements containing `pattern` raise an error.
    #[must_use]
    pub fn break_polling_when(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.when(pattern, ScriptedBehavior::BreakPolling(message.into()))
    }

    /// Statements containing `pattern` stay `RUNNING` for `polls` polls.
    #[must_use]
    pub fn running_polls(self, pattern: impl Into<String>, polls: usize) -> Self {
        self.when(pattern, ScriptedBehavior::RunningPolls(polls))
    }

    /// Statements containing `pattern` succeed and return `rows`.
    #[must_use]
    pub fn rows_when(self, pattern: impl Into<String>, rows: Vec<ResultRow>) -> Self {
        self.when(pattern, ScriptedBehavior::Rows(rows))
    }

    /// Returns every submitted request in order.
    #[must_use]
    pub fn submitted(&self) -> Vec<QueryRequest> {
        self.state.lock().submitted.clone()
    }

    /// Returns the submitted statement texts in order.
    #[must_use]
    pub fn submitted_queries(&self) -> Vec<String> {
        self.state
            .lock()
            .submitted
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }

    /// Returns the ids of accepted executions in submission order.
    #[must_use]
    pub fn execution_ids(&self) -> Vec<String> {
        self.state.lock().order.clone()
    }

    /// Returns how many times an execution was polled.
    #[must_use]
    pub fn poll_count(&self, execution_id: &str) -> usize {
        self.state
            .lock()
            .executions
            .get(execution_id)
            .map_or(0, |e| e.polls)
    }

    /// Returns the request behind an execution id.
    #[must_use]
    pub fn request_for(&self, execution_id: &str) -> Option<QueryRequest> {
        self.state
            .lock()
            .executions
            .get(execution_id)
            .map(|e| e.request.clone())
    }

    /// Forgets all recorded submissions.
    pub fn reset(&self) {
        *self.state.lock() = EngineState::default();
    }

    fn behavior_for(&self, query: &str) -> ScriptedBehavior {
        self.rules
            .iter()
            .find(|(pattern, _)| query.contains(pattern.as_str()))
            .map_or(ScriptedBehavior::Succeed, |(_, behavior)| behavior.clone())
    }
}

#[async_trait]
impl QueryEngine for ScriptedQueryEngine {
    async fn submit(&self, request: &QueryRequest) -> Result<String, EngineError> {
        let behavior = self.behavior_for(&request.query);
        let mut state = self.state.lock();
        state.submitted.push(request.clone());

        if let ScriptedBehavior::Reject(message) = behavior {
            return Err(EngineError::submission(message));
        }

        state.next_id += 1;
        let execution_id = format!("exec-{:04}", state.next_id);
        state.order.push(execution_id.clone());
        state.executions.insert(
            execution_id.clone(),
            Execution {
                request: request.clone(),
                behavior,
                polls: 0,
            },
        );
        Ok(execution_id)
    }

    async fn poll_status(&self, execution_id: &str) -> Result<ExecutionStatus, EngineError> {
        let mut state = self.state.lock();
        let execution = state
            .executions
            .get_mut(execution_id)
            .ok_or_else(|| EngineError::polling(execution_id, "unknown execution id"))?;
        execution.polls += 1;

        let status = match &execution.behavior {
            ScriptedBehavior::Succeed | ScriptedBehavior::Rows(_) => {
                ExecutionStatus::new(ExecutionState::Succeeded)
            }
            ScriptedBehavior::RunningPolls(n) if execution.polls <= *n => {
                ExecutionStatus::new(ExecutionState::Running)
            }
            ScriptedBehavior::RunningPolls(_) => ExecutionStatus::new(ExecutionState::Succeeded),
            ScriptedBehavior::Fail(reason) => ExecutionStatus::failed(reason.clone()),
            ScriptedBehavior::Cancel => ExecutionStatus::new(ExecutionState::Cancelled),
            ScriptedBehavior::Hang => ExecutionStatus::new(ExecutionState::Running),
            ScriptedBehavior::BreakPolling(message) => {
                return Err(EngineError::polling(execution_id, message.clone()));
            }
            ScriptedBehavior::Reject(_) => {
                return Err(EngineError::polling(execution_id, "execution was rejected"));
            }
        };
        Ok(status)
    }

    async fn fetch_rows(
        &self,
        execution_id: &str,
        max_rows: usize,
    ) -> Result<Vec<ResultRow>, EngineError> {
        let state = self.state.lock();
        match state.executions.get(execution_id).map(|e| &e.behavior) {
            Some(ScriptedBehavior::Rows(rows)) => Ok(rows.iter().take(max_rows).cloned().collect()),
            Some(_) => Ok(Vec::new()),
            None => Err(EngineError::polling(execution_id, "unknown execution id")),
        }
    }
}
