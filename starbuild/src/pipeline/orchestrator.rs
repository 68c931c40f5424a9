//! Stage sequencing with fail-fast semantics.

use super::report::{ReportBuilder, RunReport, ValidationCheck};
use super::selector::StageSelector;
use crate::catalog::StageCatalog;
use crate::config::WarehouseConfig;
use crate::core::{Artifact, QueryOutcome, StageName, StageStatus, Statement, UNKNOWN_ERROR};
use crate::engine::{QueryEngine, ResultRow};
use crate::errors::{StageAbortError, WarehouseError};
use crate::events::{self, EventSink, NoOpEventSink};
use crate::observability::SpanTimer;
use crate::query::QueryRunner;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Rows read back from each validation count query.
const VALIDATION_ROWS: usize = 1;

/// Runs the stages of the warehouse build against one query engine.
///
/// Stages run strictly in order and statements within a stage run one at a
/// time, each awaited to a terminal outcome before the next is submitted.
/// The first create statement that does not succeed aborts the run; the
/// report keeps every artifact created before it.
#[derive(Debug, Clone)]
pub struct PipelineOrchestrator {
    runner: QueryRunner,
    catalog: Arc<StageCatalog>,
    database: Option<String>,
    events: Arc<dyn EventSink>,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator over `catalog`.
    #[must_use]
    pub fn new(runner: QueryRunner, catalog: Arc<StageCatalog>) -> Self {
        Self {
            runner,
            catalog,
            database: None,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Builds an orchestrator from configuration.
    ///
    /// The catalog is read from `config.sql_dir` when set, otherwise from the
    /// statements compiled into the binary.
    ///
    /// # Errors
    ///
    /// Fails if the poll schedule is invalid, a statement file is missing or
    /// the catalog is inconsistent.
    pub fn from_config(
        config: &WarehouseConfig,
        engine: Arc<dyn QueryEngine>,
    ) -> Result<Self, WarehouseError> {
        config.validate()?;
        let catalog = match &config.sql_dir {
            Some(dir) => StageCatalog::from_dir(dir)?,
            None => StageCatalog::embedded()?,
        };
        let runner =
            QueryRunner::new(engine, config.output_location()).with_poll(config.poll);

        Ok(Self::new(runner, Arc::new(catalog)).with_database(config.database.clone()))
    }

    /// Builds an orchestrator talking to the HTTP engine at
    /// `config.endpoint`.
    ///
    /// # Errors
    ///
    /// Fails if no endpoint is configured, the HTTP client cannot be built,
    /// or [`PipelineOrchestrator::from_config`] fails.
    #[cfg(feature = "http")]
    pub fn connect(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let endpoint = config.engine_endpoint()?;
        let engine = crate::engine::AthenaHttpEngine::new(endpoint)?;
        Self::from_config(config, Arc::new(engine))
    }

    /// Sets the database context attached to statements.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the event sink used by the orchestrator and its runner.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.runner = self.runner.with_events(events.clone());
        self.events = events;
        self
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    /// Returns the database context.
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Handles an invocation payload of the form `{"step": "<selector>"}`.
    ///
    /// A null payload, or an object without a `step` or with a null one,
    /// runs every stage. Any other payload shape is rejected without running
    /// anything.
    pub async fn handle_event(&self, event: &Value) -> RunReport {
        let step = match event {
            Value::Null => "all".to_string(),
            Value::Object(fields) => match fields.get("step") {
                None | Some(Value::Null) => "all".to_string(),
                Some(Value::String(step)) => step.clone(),
                Some(other) => other.to_string(),
            },
            other => {
                let payload = other.to_string();
                return self.reject(&payload, &WarehouseError::InvalidEvent(payload.clone()));
            }
        };
        info!(step = %step, "Requested step");
        self.run_step(&step).await
    }

    /// Parses `step` and runs it.
    ///
    /// An unknown selector produces a failure report without running anything.
    pub async fn run_step(&self, step: &str) -> RunReport {
        match step.parse::<StageSelector>() {
            Ok(selector) => self.run(selector).await,
            Err(err) => self.reject(step, &err),
        }
    }

    /// Reports a request that was refused before any stage ran.
    fn reject(&self, step: &str, err: &WarehouseError) -> RunReport {
        let mut report = ReportBuilder::start(step);
        warn!(run_id = %report.run_id(), step, error = %err, "Rejected step");
        self.events.emit(
            events::RUN_FAILED,
            json!({"run_id": report.run_id(), "step": step, "error": err.to_string()}),
        );
        report.fail(None, None, err.to_string());
        report.finish()
    }

    /// Runs the stages named by `selector`.
    pub async fn run(&self, selector: StageSelector) -> RunReport {
        let mut report = ReportBuilder::start(selector.as_str());
        let run_id = report.run_id();
        let stages = selector.stages();

        info!(%run_id, step = %selector, "Warehouse build started");
        self.events.emit(
            events::RUN_STARTED,
            json!({"run_id": run_id, "step": selector.as_str(), "stages": &stages}),
        );

        for stage in stages {
            if let Err(err) = self.run_stage(stage, &mut report).await {
                let artifact = match &err {
                    WarehouseError::StageAbort(abort) => Some(abort.artifact.clone()),
                    _ => None,
                };
                error!(%run_id, stage = %stage, artifact = ?artifact, error = %err, "Warehouse build failed");
                self.events.emit(
                    events::RUN_FAILED,
                    json!({
                        "run_id": run_id,
                        "step": selector.as_str(),
                        "stage": stage,
                        "artifact": &artifact,
                        "error": err.to_string(),
                    }),
                );
                report.fail(Some(stage), artifact, err.to_string());
                return report.finish();
            }
        }

        let report = report.finish();
        info!(%run_id, duration_ms = report.duration_ms, "Warehouse build completed");
        self.events.emit(
            events::RUN_COMPLETED,
            json!({
                "run_id": run_id,
                "step": selector.as_str(),
                "duration_ms": report.duration_ms,
            }),
        );
        report
    }

    async fn run_stage(
        &self,
        stage: StageName,
        report: &mut ReportBuilder,
    ) -> Result<(), WarehouseError> {
        let statements = self.catalog.statements(stage);
        let timer = SpanTimer::start(format!("stage.{stage}"));
        let mut status = StageStatus::Pending;

        debug!(stage = %stage, from = ?status, to = ?StageStatus::Running, "Stage transition");
        status = StageStatus::Running;
        info!(stage = %stage, statements = statements.len(), "Stage started");
        self.events.emit(
            events::STAGE_STARTED,
            json!({"stage": stage, "status": status, "statements": statements.len()}),
        );

        let result = if stage.produces_artifacts() {
            self.create_artifacts(stage, statements, report).await
        } else {
            self.validate(statements, report).await;
            Ok(())
        };

        let next = if result.is_ok() {
            StageStatus::Completed
        } else {
            StageStatus::Failed
        };
        debug!(stage = %stage, from = ?status, to = ?next, "Stage transition");
        status = next;

        let duration_ms = timer.finish();
        report.record_stage(stage, status, duration_ms);

        match &result {
            Ok(()) => {
                info!(stage = %stage, duration_ms, "Stage completed");
                self.events.emit(
                    events::STAGE_COMPLETED,
                    json!({"stage": stage, "status": status, "duration_ms": duration_ms}),
                );
            }
            Err(err) => {
                error!(stage = %stage, artifact = %err.artifact, error = %err.message, "Stage failed");
                self.events.emit(
                    events::STAGE_FAILED,
                    json!({
                        "stage": stage,
                        "status": status,
                        "duration_ms": duration_ms,
                        "error": err.to_dict(),
                    }),
                );
            }
        }
        result.map_err(WarehouseError::from)
    }

    async fn create_artifacts(
        &self,
        stage: StageName,
        statements: &[Statement],
        report: &mut ReportBuilder,
    ) -> Result<(), StageAbortError> {
        for statement in statements {
            // The catalog rejects create statements without an artifact.
            let Some(artifact) = statement.artifact.as_ref() else {
                continue;
            };

            self.drop_artifact(artifact).await;

            let outcome = self
                .runner
                .execute_statement(statement, self.database())
                .await;
            if !outcome.is_success() {
                return Err(StageAbortError::new(
                    stage.as_str(),
                    artifact.name.as_str(),
                    outcome.error().unwrap_or(UNKNOWN_ERROR),
                ));
            }

            info!(stage = %stage, artifact = %artifact, "Created");
            report.record_artifact(stage, artifact.name.as_str());
        }
        Ok(())
    }

    /// Drops `artifact` if it exists. Failures are logged and ignored.
    async fn drop_artifact(&self, artifact: &Artifact) {
        let statement =
            Statement::new(artifact.drop_statement()).with_label(format!("Drop {artifact}"));
        let outcome = self
            .runner
            .execute_statement(&statement, self.database())
            .await;

        if let Some(reason) = outcome.error() {
            warn!(artifact = %artifact, status = outcome.status(), error = reason, "Drop failed, continuing");
            self.events.emit(
                events::ARTIFACT_DROP_FAILED,
                json!({"artifact": &artifact.name, "kind": artifact.kind, "error": reason}),
            );
        }
    }

    async fn validate(&self, statements: &[Statement], report: &mut ReportBuilder) {
        for statement in statements {
            let table = statement
                .counted_table()
                .or(statement.label.as_deref())
                .unwrap_or("query")
                .to_string();

            let outcome = self
                .runner
                .execute_statement(statement, self.database())
                .await;

            let check = match &outcome {
                QueryOutcome::Succeeded { execution_id } => {
                    let row_count = self.read_count(&table, execution_id).await;
                    info!(table = %table, row_count = ?row_count, "Validation count");
                    ValidationCheck::counted(table, row_count)
                }
                _ => {
                    let reason = outcome.error().unwrap_or(UNKNOWN_ERROR);
                    warn!(table = %table, status = outcome.status(), error = reason, "Validation query failed");
                    ValidationCheck::failed(table, reason)
                }
            };

            self.events.emit(events::VALIDATION_COUNTED, json!(&check));
            report.record_validation(check);
        }
    }

    async fn read_count(&self, table: &str, execution_id: &str) -> Option<u64> {
        match self.runner.fetch_rows(execution_id, VALIDATION_ROWS).await {
            Ok(rows) => {
                let count = rows.first().and_then(parse_count);
                if count.is_none() {
                    warn!(table, execution_id, "Validation query returned no count");
                }
                count
            }
            Err(err) => {
                warn!(table, execution_id, error = %err, "Could not read validation count");
                None
            }
        }
    }
}

/// Reads the `cnt` column of a `SELECT '<table>', COUNT(*)` row.
fn parse_count(row: &ResultRow) -> Option<u64> {
    row.get(1)?.as_deref()?.trim().parse().ok()
}
