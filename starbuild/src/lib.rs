//! # Starbuild
//!
//! Builds a star-schema claims warehouse on a serverless SQL query engine.
//!
//! Starbuild sequences a fixed plan of SQL statements against the engine:
//!
//! - **views**: transformation views over the raw claims tables
//! - **dims**: dimension tables
//! - **facts**: fact tables joined from the dimensions
//! - **validate**: read-only row counts over every table
//!
//! Every artifact is dropped before it is re-created, so any stage can be
//! re-run on its own. Stages run strictly in order, one statement at a time,
//! and the first failing create statement aborts the run. The returned
//! [`RunReport`](pipeline::RunReport) lists every artifact created before the
//! failure.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use starbuild::prelude::*;
//!
//! let config = WarehouseConfig::from_env().with_endpoint("http://localhost:4566");
//! let orchestrator = PipelineOrchestrator::connect(&config)?;
//!
//! let report = orchestrator.run_step("dims").await;
//! println!("{}", report.to_json_pretty()?);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod catalog;
pub mod config;
pub mod core;
pub mod engine;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod query;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::{EmbeddedSource, FileSource, StageCatalog, StatementSource};
    pub use crate::config::{PollConfig, WarehouseConfig};
    pub use crate::core::{
        Artifact, ArtifactKind, ExecutionState, QueryOutcome, StageName, StageStatus, Statement,
    };
    #[cfg(feature = "http")]
    pub use crate::engine::AthenaHttpEngine;
    pub use crate::engine::{ExecutionStatus, QueryEngine, QueryRequest};
    pub use crate::errors::{EngineError, StageAbortError, WarehouseError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_logging, LogFormat};
    pub use crate::pipeline::{PipelineOrchestrator, RunReport, StageSelector, ValidationCheck};
    pub use crate::query::QueryRunner;
    pub use std::sync::Arc;
}
