//! Warehouse build orchestration.
//!
//! This module provides:
//! - Stage selection
//! - The fail-fast stage orchestrator
//! - The run report

mod orchestrator;
mod report;
mod selector;

#[cfg(test)]
mod integration_tests;

pub use orchestrator::PipelineOrchestrator;
pub use report::{
    ReportBuilder, RunReport, StageSummary, ValidationCheck, STATUS_FAILED, STATUS_OK,
};
pub use selector::StageSelector;
