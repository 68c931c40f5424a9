//! Core domain model types.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage names, stage status and engine execution state
//! - Statements and the artifacts they produce
//! - Query outcomes

mod artifact;
mod outcome;
mod statement;
mod status;

pub use artifact::{Artifact, ArtifactKind};
pub use outcome::{QueryOutcome, TIMEOUT_ERROR, UNKNOWN_ERROR};
pub use statement::{fingerprint, preview, Statement, PREVIEW_CHARS};
pub use status::{ExecutionState, StageName, StageStatus};
