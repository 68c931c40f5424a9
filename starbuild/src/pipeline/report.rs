//! The run report returned to callers.

use crate::core::{StageName, StageStatus};
use crate::errors::WarehouseError;
use crate::observability::SpanTimer;
use crate::utils::{format_timestamp, generate_run_id, now_utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status code of a successful run.
pub const STATUS_OK: u16 = 200;

/// Status code of a failed run.
pub const STATUS_FAILED: u16 = 500;

/// Timing and final status of one executed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    /// The stage.
    pub stage: StageName,
    /// Final status.
    pub status: StageStatus,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: f64,
}

/// Result of one validation count query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationCheck {
    /// The counted table.
    pub table: String,
    /// Whether the count query succeeded.
    pub succeeded: bool,
    /// Row count read back from the engine, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    /// Error text when the query did not succeed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationCheck {
    /// A count query that succeeded.
    #[must_use]
    pub fn counted(table: impl Into<String>, row_count: Option<u64>) -> Self {
        Self {
            table: table.into(),
            succeeded: true,
            row_count,
            error: None,
        }
    }

    /// A count query that did not succeed.
    #[must_use]
    pub fn failed(table: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            succeeded: false,
            row_count: None,
            error: Some(error.into()),
        }
    }
}

/// Structured outcome of a run.
///
/// The `*_created` lists hold, in creation order, exactly the artifacts whose
/// create statement succeeded during this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// 200 on success, 500 on failure.
    pub status_code: u16,
    /// The requested selector, as given.
    pub stage: String,
    /// Unique id of the run.
    pub run_id: Uuid,
    /// Completion time, RFC 3339.
    pub timestamp: String,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: f64,
    /// Views created, in order.
    pub views_created: Vec<String>,
    /// Dimension tables created, in order.
    pub dims_created: Vec<String>,
    /// Fact tables created, in order.
    pub facts_created: Vec<String>,
    /// Per executed stage status and timing.
    #[serde(default)]
    pub stages: Vec<StageSummary>,
    /// Validation count results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationCheck>,
    /// The stage that aborted the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<StageName>,
    /// The artifact whose create statement failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_artifact: Option<String>,
    /// Error text of the failure, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// Returns true if the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// Returns the artifacts created by `stage`.
    #[must_use]
    pub fn created(&self, stage: StageName) -> &[String] {
        match stage {
            StageName::Views => &self.views_created,
            StageName::Dims => &self.dims_created,
            StageName::Facts => &self.facts_created,
            StageName::Validate => &[],
        }
    }

    /// Returns the summary of `stage`, if it was executed.
    #[must_use]
    pub fn stage_summary(&self, stage: StageName) -> Option<&StageSummary> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Serializes the report to compact JSON.
    pub fn to_json(&self) -> Result<String, WarehouseError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the report to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, WarehouseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Accumulates a report while a run is in progress.
#[derive(Debug)]
pub struct ReportBuilder {
    report: RunReport,
    timer: SpanTimer,
}

impl ReportBuilder {
    /// Starts a report for the selector `stage`.
    #[must_use]
    pub fn start(stage: impl Into<String>) -> Self {
        let run_id = generate_run_id();
        Self {
            report: RunReport {
                status_code: STATUS_OK,
                stage: stage.into(),
                run_id,
                timestamp: format_timestamp(&now_utc()),
                duration_ms: 0.0,
                views_created: Vec::new(),
                dims_created: Vec::new(),
                facts_created: Vec::new(),
                stages: Vec::new(),
                validation: Vec::new(),
                failed_stage: None,
                failed_artifact: None,
                error: None,
            },
            timer: SpanTimer::start(format!("run.{run_id}")),
        }
    }

    /// Returns the run id.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.report.run_id
    }

    /// Records an artifact whose create statement succeeded.
    pub fn record_artifact(&mut self, stage: StageName, name: impl Into<String>) {
        let list = match stage {
            StageName::Views => &mut self.report.views_created,
            StageName::Dims => &mut self.report.dims_created,
            StageName::Facts => &mut self.report.facts_created,
            StageName::Validate => return,
        };
        list.push(name.into());
    }

    /// Records a stage reaching a terminal status.
    pub fn record_stage(&mut self, stage: StageName, status: StageStatus, duration_ms: f64) {
        self.report.stages.push(StageSummary {
            stage,
            status,
            duration_ms,
        });
    }

    /// Records a validation count result.
    pub fn record_validation(&mut self, check: ValidationCheck) {
        self.report.validation.push(check);
    }

    /// Marks the run failed.
    pub fn fail(
        &mut self,
        stage: Option<StageName>,
        artifact: Option<String>,
        error: impl Into<String>,
    ) {
        self.report.status_code = STATUS_FAILED;
        self.report.failed_stage = stage;
        self.report.failed_artifact = artifact;
        self.report.error = Some(error.into());
    }

    /// Stamps the completion time and duration and returns the report.
    #[must_use]
    pub fn finish(mut self) -> RunReport {
        self.report.duration_ms = self.timer.finish();
        self.report.timestamp = format_timestamp(&now_utc());
        self.report
    }
}
