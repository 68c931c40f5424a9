//! Athena JSON protocol client over HTTP.
//!
//! Requests are sent unsigned. The configured endpoint must take care of
//! authentication itself, e.g. a local emulator or a signing proxy.

use super::{ExecutionStatus, QueryEngine, QueryRequest, ResultRow};
use crate::core::ExecutionState;
use crate::errors::EngineError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AmazonAthena";

/// The engine caps a single results page at this many rows.
const MAX_RESULTS_PAGE: usize = 1000;

/// Query engine backed by the Athena JSON 1.1 API.
#[derive(Debug, Clone)]
pub struct AthenaHttpEngine {
    client: reqwest::Client,
    endpoint: String,
}

impl AthenaHttpEngine {
    /// Creates a client for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Creates an engine reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<B, R>(&self, action: &str, body: &B) -> Result<R, EngineError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .json(body)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(EngineError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| EngineError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl QueryEngine for AthenaHttpEngine {
    async fn submit(&self, request: &QueryRequest) -> Result<String, EngineError> {
        let body = StartQueryExecutionInput::from(request);
        let output: StartQueryExecutionOutput = self
            .call("StartQueryExecution", &body)
            .await
            .map_err(|e| EngineError::submission(e.to_string()))?;
        Ok(output.query_execution_id)
    }

    async fn poll_status(&self, execution_id: &str) -> Result<ExecutionStatus, EngineError> {
        let body = QueryExecutionIdInput {
            query_execution_id: execution_id,
            max_results: None,
        };
        let output: GetQueryExecutionOutput = self
            .call("GetQueryExecution", &body)
            .await
            .map_err(|e| EngineError::polling(execution_id, e.to_string()))?;
        output.into_status()
    }

    async fn fetch_rows(
        &self,
        execution_id: &str,
        max_rows: usize,
    ) -> Result<Vec<ResultRow>, EngineError> {
        // The first row of a SELECT result set is the column header.
        let body = QueryExecutionIdInput {
            query_execution_id: execution_id,
            max_results: Some(max_rows.saturating_add(1).min(MAX_RESULTS_PAGE)),
        };
        let output: GetQueryResultsOutput = self.call("GetQueryResults", &body).await?;
        Ok(output.data_rows(max_rows))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionInput<'a> {
    query_string: &'a str,
    result_configuration: ResultConfiguration<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_execution_context: Option<QueryExecutionContext<'a>>,
}

impl<'a> From<&'a QueryRequest> for StartQueryExecutionInput<'a> {
    fn from(request: &'a QueryRequest) -> Self {
        Self {
            query_string: &request.query,
            result_configuration: ResultConfiguration {
                output_location: &request.output_location,
            },
            query_execution_context: request
                .database
                .as_deref()
                .map(|database| QueryExecutionContext { database }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResultConfiguration<'a> {
    output_location: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionContext<'a> {
    database: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionIdInput<'a> {
    query_execution_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionOutput {
    query_execution_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryExecutionOutput {
    query_execution: QueryExecution,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecution {
    status: QueryExecutionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionStatus {
    state: String,
    #[serde(default)]
    state_change_reason: Option<String>,
}

impl GetQueryExecutionOutput {
    fn into_status(self) -> Result<ExecutionStatus, EngineError> {
        let status = self.query_execution.status;
        let state = ExecutionState::from_wire(&status.state).ok_or_else(|| {
            EngineError::MalformedResponse(format!("unknown execution state '{}'", status.state))
        })?;
        Ok(ExecutionStatus {
            state,
            reason: status.state_change_reason,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryResultsOutput {
    result_set: ResultSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultSet {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Row {
    #[serde(default)]
    data: Vec<Datum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Datum {
    #[serde(default)]
    var_char_value: Option<String>,
}

impl GetQueryResultsOutput {
    fn data_rows(self, max_rows: usize) -> Vec<ResultRow> {
        self.result_set
            .rows
            .into_iter()
            .skip(1)
            .take(max_rows)
            .map(|row| row.data.into_iter().map(|d| d.var_char_value).collect())
            .collect()
    }
}
