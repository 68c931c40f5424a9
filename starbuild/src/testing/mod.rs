//! Testing utilities for warehouse builds.
//!
//! This module provides:
//! - A scripted in-memory query engine
//! - Assertions over run reports

mod assertions;
mod mocks;

pub use assertions::{
    assert_created, assert_report_failed, assert_report_succeeded, assert_stage_status,
};
pub use mocks::{ScriptedBehavior, ScriptedQueryEngine};
