//! End-to-end orchestration scenarios against the scripted engine.

#[cfg(test)]
mod tests {
    use crate::catalog::StageCatalog;
    use crate::config::{PollConfig, WarehouseConfig};
    use crate::core::{Artifact, StageName, StageStatus, Statement, TIMEOUT_ERROR};
    use crate::errors::WarehouseError;
    use crate::events::{self, CollectingEventSink};
    use crate::pipeline::{PipelineOrchestrator, StageSelector};
    use crate::query::QueryRunner;
    use crate::testing::{
        assert_created, assert_report_failed, assert_report_succeeded, assert_stage_status,
        ScriptedQueryEngine,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    const OUTPUT: &str = "s3://insurance-claim-qian-2025/athena_results/";
    const DATABASE: &str = "insurance_claim_db";

    const DIMS: [&str; 5] = [
        "dim_date_etl",
        "dim_provider_etl",
        "dim_patient_etl",
        "dim_diagnosis_etl",
        "dim_procedure_etl",
    ];

    fn fast_poll() -> PollConfig {
        PollConfig::new().with_interval_ms(0)
    }

    fn orchestrator(engine: &Arc<ScriptedQueryEngine>, catalog: StageCatalog) -> PipelineOrchestrator {
        let runner = QueryRunner::new(engine.clone(), OUTPUT).with_poll(fast_poll());
        PipelineOrchestrator::new(runner, Arc::new(catalog)).with_database(DATABASE)
    }

    fn embedded(engine: &Arc<ScriptedQueryEngine>) -> PipelineOrchestrator {
        orchestrator(engine, StageCatalog::embedded().unwrap())
    }

    fn five_tables() -> StageCatalog {
        let statements = (1..=5)
            .map(|i| {
                Statement::creating(
                    format!("CREATE TABLE t{i} AS SELECT {i} AS n"),
                    Artifact::table(format!("t{i}")),
                )
            })
            .collect();
        StageCatalog::new()
            .with_stage(StageName::Dims, statements)
            .unwrap()
    }

    #[tokio::test]
    async fn test_dims_only_creates_five_tables_in_order() {
        let engine = Arc::new(ScriptedQueryEngine::new());
        let report = embedded(&engine).run(StageSelector::Only(StageName::Dims)).await;

        assert_report_succeeded(&report);
        assert_eq!(report.status_code, 200);
        assert_eq!(report.stage, "dims");
        assert_created(&report, StageName::Dims, &DIMS);
        assert_created(&report, StageName::Views, &[]);
        assert_created(&report, StageName::Facts, &[]);
        assert_eq!(report.stages.len(), 1);
        assert_stage_status(&report, StageName::Dims, StageStatus::Completed);
        assert!(report.validation.is_empty());

        let queries = engine.submitted_queries();
        assert_eq!(queries.len(), 10);
        for (i, name) in DIMS.iter().enumerate() {
            assert_eq!(queries[2 * i], format!("DROP TABLE IF EXISTS {name}"));
            assert!(queries[2 * i + 1].starts_with(&format!("CREATE TABLE {name}")));
        }
    }

    #[tokio::test]
    async fn test_all_with_second_view_failing_aborts_run() {
        let engine = Arc::new(
            ScriptedQueryEngine::new().fail_when(
                "CREATE OR REPLACE VIEW v_patients_etl",
                "SYNTAX_ERROR: line 4:5: Column 'bene_id' cannot be resolved",
            ),
        );
        let report = embedded(&engine).run(StageSelector::All).await;

        assert_report_failed(&report, StageName::Views, "v_patients_etl");
        assert_eq!(report.status_code, 500);
        assert_created(&report, StageName::Views, &["v_providers_etl"]);
        assert_created(&report, StageName::Dims, &[]);
        assert_created(&report, StageName::Facts, &[]);
        assert!(report.error.as_deref().unwrap().contains("SYNTAX_ERROR"));
        assert!(report.error.as_deref().unwrap().contains("v_patients_etl"));

        assert_eq!(report.stages.len(), 1);
        assert_stage_status(&report, StageName::Views, StageStatus::Failed);
        assert!(engine.submitted_queries().iter().all(|q| !q.contains("dim_")));
    }

    #[tokio::test]
    async fn test_third_of_five_failing_stops_the_stage() {
        let engine = Arc::new(ScriptedQueryEngine::new().fail_when("CREATE TABLE t3", "HIVE_BAD_DATA"));
        let report = orchestrator(&engine, five_tables())
            .run(StageSelector::Only(StageName::Dims))
            .await;

        assert_report_failed(&report, StageName::Dims, "t3");
        assert_created(&report, StageName::Dims, &["t1", "t2"]);
        assert_eq!(
            report.error.as_deref(),
            Some("Failed to create t3: HIVE_BAD_DATA")
        );

        let queries = engine.submitted_queries();
        assert_eq!(queries.len(), 6);
        assert!(queries.iter().all(|q| !q.contains("t4") && !q.contains("t5")));
    }

    #[tokio::test]
    async fn test_running_dims_twice_is_idempotent() {
        let engine = Arc::new(ScriptedQueryEngine::new());
        let orchestrator = embedded(&engine);

        let first = orchestrator.run(StageSelector::Only(StageName::Dims)).await;
        let second = orchestrator.run(StageSelector::Only(StageName::Dims)).await;

        assert_report_succeeded(&first);
        assert_report_succeeded(&second);
        assert_eq!(first.dims_created, second.dims_created);
        assert_ne!(first.run_id, second.run_id);

        let drops = engine
            .submitted_queries()
            .iter()
            .filter(|q| q.starts_with("DROP TABLE IF EXISTS"))
            .count();
        assert_eq!(drops, 10);
    }

    #[tokio::test]
    async fn test_drop_failure_is_not_fatal() {
        let sink = Arc::new(CollectingEventSink::new());
        let engine = Arc::new(
            ScriptedQueryEngine::new()
                .fail_when("DROP TABLE IF EXISTS dim_date_etl", "AccessDeniedException"),
        );
        let report = embedded(&engine)
            .with_events(sink.clone())
            .run(StageSelector::Only(StageName::Dims))
            .await;

        assert_report_succeeded(&report);
        assert_created(&report, StageName::Dims, &DIMS);

        let drop_failures = sink.events_of_type(events::ARTIFACT_DROP_FAILED);
        assert_eq!(drop_failures.len(), 1);
        assert_eq!(drop_failures[0].1["artifact"], "dim_date_etl");
        assert_eq!(drop_failures[0].1["error"], "AccessDeniedException");
    }

    #[tokio::test]
    async fn test_validation_failures_do_not_fail_the_run() {
        let engine = Arc::new(
            ScriptedQueryEngine::new()
                .fail_when("FROM fact_claims_etl", "TABLE_NOT_FOUND: fact_claims_etl")
                .rows_when(
                    "FROM dim_date_etl",
                    vec![vec![Some("dim_date_etl".to_string()), Some("365".to_string())]],
                ),
        );
        let report = embedded(&engine)
            .run(StageSelector::Only(StageName::Validate))
            .await;

        assert_report_succeeded(&report);
        assert_stage_status(&report, StageName::Validate, StageStatus::Completed);
        assert_eq!(report.validation.len(), 8);

        let date = &report.validation[0];
        assert_eq!(date.table, "dim_date_etl");
        assert!(date.succeeded);
        assert_eq!(date.row_count, Some(365));

        let claims = report
            .validation
            .iter()
            .find(|c| c.table == "fact_claims_etl")
            .unwrap();
        assert!(!claims.succeeded);
        assert!(claims.error.as_deref().unwrap().contains("TABLE_NOT_FOUND"));

        let provider = &report.validation[1];
        assert!(provider.succeeded);
        assert_eq!(provider.row_count, None);

        assert!(report.views_created.is_empty());
        assert!(report.dims_created.is_empty());
        assert!(engine.submitted_queries().iter().all(|q| q.starts_with("SELECT")));
    }

    #[tokio::test]
    async fn test_statement_timeout_aborts_stage() {
        let engine = Arc::new(ScriptedQueryEngine::new().hang_when("CREATE TABLE dim_patient_etl"));
        let report = embedded(&engine)
            .run(StageSelector::Only(StageName::Dims))
            .await;

        assert_report_failed(&report, StageName::Dims, "dim_patient_etl");
        assert_created(&report, StageName::Dims, &["dim_date_etl", "dim_provider_etl"]);
        assert!(report.error.as_deref().unwrap().contains(TIMEOUT_ERROR));

        let hung = engine.execution_ids().last().cloned().unwrap();
        assert_eq!(engine.poll_count(&hung), 150);
    }

    #[tokio::test]
    async fn test_rejected_submission_aborts_stage() {
        let engine = Arc::new(
            ScriptedQueryEngine::new()
                .reject_when("CREATE TABLE fact_claims_etl", "AccessDeniedException"),
        );
        let report = embedded(&engine)
            .run(StageSelector::Only(StageName::Facts))
            .await;

        assert_report_failed(&report, StageName::Facts, "fact_claims_etl");
        assert!(report.facts_created.is_empty());
        assert!(report.error.as_deref().unwrap().contains("AccessDeniedException"));
        assert_eq!(engine.submitted_queries().len(), 2);
    }

    #[tokio::test]
    async fn test_statements_wait_for_terminal_state() {
        let engine = Arc::new(ScriptedQueryEngine::new().running_polls("CREATE TABLE t2", 3));
        let report = orchestrator(&engine, five_tables())
            .run(StageSelector::Only(StageName::Dims))
            .await;

        assert_report_succeeded(&report);
        assert_created(&report, StageName::Dims, &["t1", "t2", "t3", "t4", "t5"]);

        let slow = engine.execution_ids()[3].clone();
        assert!(engine.request_for(&slow).unwrap().query.starts_with("CREATE TABLE t2"));
        assert_eq!(engine.poll_count(&slow), 4);
        assert!(engine
            .execution_ids()
            .iter()
            .all(|id| engine.poll_count(id) >= 1));
    }

    #[tokio::test]
    async fn test_unknown_step_runs_nothing() {
        let sink = Arc::new(CollectingEventSink::new());
        let engine = Arc::new(ScriptedQueryEngine::new());
        let report = embedded(&engine).with_events(sink.clone()).run_step("raw").await;

        assert_eq!(report.status_code, 500);
        assert_eq!(report.stage, "raw");
        assert!(report.error.as_deref().unwrap().contains("Unknown stage"));
        assert!(report.failed_stage.is_none());
        assert!(report.stages.is_empty());
        assert!(engine.submitted().is_empty());
        assert_eq!(sink.event_types(), vec![events::RUN_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn test_handle_event_defaults_to_all() {
        let engine = Arc::new(ScriptedQueryEngine::new());
        let report = embedded(&engine).handle_event(&json!({})).await;

        assert_report_succeeded(&report);
        assert_eq!(report.stage, "all");
        assert_eq!(report.views_created.len(), 5);
        assert_eq!(report.dims_created.len(), 5);
        assert_eq!(report.facts_created.len(), 3);
        assert_eq!(report.validation.len(), 8);

        let order: Vec<StageName> = report.stages.iter().map(|s| s.stage).collect();
        assert_eq!(order, StageName::ORDERED.to_vec());
        assert_eq!(engine.submitted().len(), 13 * 2 + 8);
    }

    #[tokio::test]
    async fn test_handle_event_reads_step() {
        let engine = Arc::new(ScriptedQueryEngine::new());
        let orchestrator = embedded(&engine);

        let report = orchestrator.handle_event(&json!({"step": "facts"})).await;
        assert_report_succeeded(&report);
        assert_eq!(report.stage, "facts");
        assert_created(
            &report,
            StageName::Facts,
            &[
                "fact_claims_etl",
                "fact_provider_summary_etl",
                "fact_patient_claims_summary_etl",
            ],
        );

        let report = orchestrator.handle_event(&json!({"step": 7})).await;
        assert_eq!(report.status_code, 500);
    }

    #[tokio::test]
    async fn test_handle_event_rejects_non_object_payloads() {
        let sink = Arc::new(CollectingEventSink::new());
        let engine = Arc::new(ScriptedQueryEngine::new());
        let orchestrator = embedded(&engine).with_events(sink.clone());

        for payload in [json!("dims"), json!([1]), json!(7), json!(true)] {
            let report = orchestrator.handle_event(&payload).await;

            assert_eq!(report.status_code, 500);
            assert_eq!(report.stage, payload.to_string());
            assert!(report.error.as_deref().unwrap().contains("Invalid event"));
            assert!(report.stages.is_empty());
        }
        assert!(engine.submitted().is_empty());
        assert_eq!(sink.events_of_type(events::RUN_FAILED).len(), 4);
        assert!(sink.events_of_type(events::RUN_STARTED).is_empty());
    }

    #[tokio::test]
    async fn test_handle_event_null_payload_runs_all() {
        let engine = Arc::new(ScriptedQueryEngine::new());
        let report = orchestrator(&engine, five_tables())
            .handle_event(&serde_json::Value::Null)
            .await;

        assert_report_succeeded(&report);
        assert_eq!(report.stage, "all");
        assert_eq!(report.dims_created.len(), 5);
    }

    #[tokio::test]
    async fn test_every_statement_carries_database_and_output_location() {
        let engine = Arc::new(ScriptedQueryEngine::new());
        embedded(&engine).run(StageSelector::Only(StageName::Views)).await;

        let submitted = engine.submitted();
        assert_eq!(submitted.len(), 10);
        for request in submitted {
            assert_eq!(request.database.as_deref(), Some(DATABASE));
            assert_eq!(request.output_location, OUTPUT);
        }
    }

    #[tokio::test]
    async fn test_lifecycle_events_in_order() {
        let sink = Arc::new(CollectingEventSink::new());
        let engine = Arc::new(ScriptedQueryEngine::new());
        let orchestrator = orchestrator(&engine, five_tables()).with_events(sink.clone());

        orchestrator.run(StageSelector::Only(StageName::Dims)).await;

        let types = sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some(events::RUN_STARTED));
        assert_eq!(types[1], events::STAGE_STARTED);
        assert_eq!(types.last().map(String::as_str), Some(events::RUN_COMPLETED));
        assert_eq!(sink.events_of_type(events::STAGE_COMPLETED).len(), 1);
        assert_eq!(sink.events_of_type(events::QUERY_SUBMITTED).len(), 10);
        assert_eq!(sink.events_of_type(events::QUERY_SUCCEEDED).len(), 10);

        let completed = &sink.events_of_type(events::STAGE_COMPLETED)[0].1;
        assert_eq!(completed["stage"], "dims");
        assert_eq!(completed["status"], "completed");
    }

    #[tokio::test]
    async fn test_from_config_wires_catalog_and_locations() {
        let config = WarehouseConfig::new()
            .with_bucket("claims-test")
            .with_database("claims_db")
            .with_poll(fast_poll());
        let engine = Arc::new(ScriptedQueryEngine::new());
        let orchestrator = PipelineOrchestrator::from_config(&config, engine.clone()).unwrap();

        assert_eq!(orchestrator.database(), Some("claims_db"));
        assert_eq!(orchestrator.catalog().len(), 21);

        let report = orchestrator.run_step("views").await;
        assert_report_succeeded(&report);
        let request = &engine.submitted()[0];
        assert_eq!(request.output_location, "s3://claims-test/athena_results/");
        assert_eq!(request.database.as_deref(), Some("claims_db"));
    }

    #[test]
    fn test_from_config_rejects_zero_poll_attempts() {
        let config = WarehouseConfig::new().with_poll(PollConfig::new().with_max_attempts(0));
        let engine = Arc::new(ScriptedQueryEngine::new());

        let err = PipelineOrchestrator::from_config(&config, engine.clone()).unwrap_err();
        assert!(matches!(err, WarehouseError::Config(_)));
        assert!(engine.submitted().is_empty());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_connect_requires_an_endpoint() {
        let err = PipelineOrchestrator::connect(&WarehouseConfig::new()).unwrap_err();
        assert!(matches!(err, WarehouseError::Config(_)));
        assert!(err.to_string().contains("ATHENA_ENDPOINT"));

        let config = WarehouseConfig::new().with_endpoint("http://localhost:4566");
        let orchestrator = PipelineOrchestrator::connect(&config).unwrap();
        assert_eq!(orchestrator.catalog().len(), 21);
    }

    #[tokio::test]
    async fn test_report_json_shape() {
        let engine = Arc::new(ScriptedQueryEngine::new().fail_when("CREATE TABLE t2", "boom"));
        let report = orchestrator(&engine, five_tables())
            .run(StageSelector::Only(StageName::Dims))
            .await;

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["status_code"], 500);
        assert_eq!(value["stage"], "dims");
        assert_eq!(value["dims_created"], json!(["t1"]));
        assert_eq!(value["views_created"], json!([]));
        assert_eq!(value["failed_stage"], "dims");
        assert_eq!(value["failed_artifact"], "t2");
        assert_eq!(value["error"], "Failed to create t2: boom");
        assert!(value["timestamp"].as_str().unwrap().ends_with("+00:00"));
    }
}
