//! Lifecycle events for observability.
//!
//! The runner and orchestrator emit one event per transition through an
//! injected [`EventSink`]. Event type names are collected here.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A run began.
pub const RUN_STARTED: &str = "run.started";
/// Every requested stage completed.
pub const RUN_COMPLETED: &str = "run.completed";
/// The run was aborted.
pub const RUN_FAILED: &str = "run.failed";
/// A stage began.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage completed.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage failed.
pub const STAGE_FAILED: &str = "stage.failed";
/// A statement was accepted by the engine.
pub const QUERY_SUBMITTED: &str = "query.submitted";
/// A statement reached `SUCCEEDED`.
pub const QUERY_SUCCEEDED: &str = "query.succeeded";
/// A statement reached `FAILED` or `CANCELLED`.
pub const QUERY_FAILED: &str = "query.failed";
/// A statement hit the polling ceiling.
pub const QUERY_TIMED_OUT: &str = "query.timed_out";
/// Submission or polling raised an error.
pub const QUERY_ERRORED: &str = "query.errored";
/// A best-effort drop did not succeed.
pub const ARTIFACT_DROP_FAILED: &str = "artifact.drop_failed";
/// A validation count query finished.
pub const VALIDATION_COUNTED: &str = "validation.counted";
