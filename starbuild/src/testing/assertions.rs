//! Test assertions for run reports.

use crate::core::{StageName, StageStatus};
use crate::pipeline::RunReport;

/// Asserts that the run succeeded.
pub fn assert_report_succeeded(report: &RunReport) {
    assert!(
        report.is_success(),
        "Expected success, got status {} with error: {:?}",
        report.status_code,
        report.error
    );
    assert!(report.error.is_none(), "Successful report carries an error");
}

/// Asserts that the run failed while creating `artifact` in `stage`.
pub fn assert_report_failed(report: &RunReport, stage: StageName, artifact: &str) {
    assert!(
        !report.is_success(),
        "Expected failure at {stage}/{artifact}, got status {}",
        report.status_code
    );
    assert_eq!(
        report.failed_stage,
        Some(stage),
        "Expected failed stage {stage}, got {:?}",
        report.failed_stage
    );
    assert_eq!(
        report.failed_artifact.as_deref(),
        Some(artifact),
        "Expected failed artifact {artifact}, got {:?}",
        report.failed_artifact
    );
    assert!(report.error.is_some(), "Failed report has no error text");
}

/// Asserts the exact artifacts `stage` created, in order.
pub fn assert_created(report: &RunReport, stage: StageName, expected: &[&str]) {
    let actual: Vec<&str> = report.created(stage).iter().map(String::as_str).collect();
    assert_eq!(
        actual, expected,
        "Unexpected {stage} artifacts: expected {expected:?}, got {actual:?}"
    );
}

/// Asserts the final status recorded for `stage`.
pub fn assert_stage_status(report: &RunReport, stage: StageName, expected: StageStatus) {
    let actual = report.stage_summary(stage).map(|s| s.status);
    assert_eq!(
        actual,
        Some(expected),
        "Expected {stage} to be {expected:?}, got {actual:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ReportBuilder;

    #[test]
    fn test_assertions_accept_matching_reports() {
        let mut builder = ReportBuilder::start("views");
        builder.record_artifact(StageName::Views, "v_providers_etl");
        builder.record_stage(StageName::Views, StageStatus::Failed, 1.0);
        builder.fail(
            Some(StageName::Views),
            Some("v_patients_etl".to_string()),
            "Failed to create v_patients_etl: SYNTAX_ERROR",
        );
        let report = builder.finish();

        assert_report_failed(&report, StageName::Views, "v_patients_etl");
        assert_created(&report, StageName::Views, &["v_providers_etl"]);
        assert_created(&report, StageName::Dims, &[]);
        assert_stage_status(&report, StageName::Views, StageStatus::Failed);
    }

    #[test]
    #[should_panic(expected = "Expected success")]
    fn test_assert_succeeded_rejects_failure() {
        let mut builder = ReportBuilder::start("all");
        builder.fail(None, None, "Unknown stage: 'raw'");
        assert_report_succeeded(&builder.finish());
    }
}
