//! Configuration for the warehouse build.

use crate::errors::WarehouseError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default pause between status polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Default number of status polls before a statement times out.
pub const DEFAULT_MAX_POLL_ATTEMPTS: usize = 150;

/// Bounded polling schedule for one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Pause between polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    /// Maximum number of polls. Must be at least 1.
    #[serde(
        default = "default_max_poll_attempts",
        deserialize_with = "deserialize_max_attempts"
    )]
    pub max_attempts: usize,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_poll_attempts() -> usize {
    DEFAULT_MAX_POLL_ATTEMPTS
}

fn deserialize_max_attempts<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = usize::deserialize(deserializer)?;
    if value == 0 {
        return Err(serde::de::Error::custom("max_attempts must be at least 1"));
    }
    Ok(value)
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_poll_attempts(),
        }
    }
}

impl PollConfig {
    /// Creates a poll config with the default schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval between polls.
    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Sets the polling ceiling. Checked by [`PollConfig::validate`].
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Rejects a schedule that would never poll.
    pub fn validate(&self) -> Result<(), WarehouseError> {
        if self.max_attempts == 0 {
            return Err(WarehouseError::Config(
                "max poll attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Gets the interval as a Duration.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Upper bound on the time spent waiting for one statement.
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.interval() * u32::try_from(self.max_attempts).unwrap_or(u32::MAX)
    }
}

/// Settings for one warehouse build invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Bucket receiving query results.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Engine region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Target database for statements.
    #[serde(default = "default_database")]
    pub database: String,
    /// Directory holding the SQL files. `None` uses the embedded statements.
    #[serde(default)]
    pub sql_dir: Option<PathBuf>,
    /// Engine endpoint override.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Whether to log at debug level by default.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    /// Polling schedule.
    #[serde(default)]
    pub poll: PollConfig,
}

fn default_bucket() -> String {
    "insurance-claim-qian-2025".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_database() -> String {
    "insurance_claim_db".to_string()
}

fn default_verbose() -> bool {
    true
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            region: default_region(),
            database: default_database(),
            sql_dir: None,
            endpoint: None,
            verbose: default_verbose(),
            poll: PollConfig::default(),
        }
    }
}

impl WarehouseConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration through `lookup`, falling back to defaults.
    ///
    /// Reads `AWS_BUCKET`, `AWS_REGION`, `AWS_DATABASE`, `SQL_DIR`,
    /// `ATHENA_ENDPOINT` and `VERBOSE`.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(bucket) = non_empty("AWS_BUCKET") {
            config.bucket = bucket;
        }
        if let Some(region) = non_empty("AWS_REGION") {
            config.region = region;
        }
        if let Some(database) = non_empty("AWS_DATABASE") {
            config.database = database;
        }
        config.sql_dir = non_empty("SQL_DIR").map(PathBuf::from);
        config.endpoint = non_empty("ATHENA_ENDPOINT");
        if let Some(verbose) = non_empty("VERBOSE") {
            config.verbose = verbose.eq_ignore_ascii_case("true");
        }
        config
    }

    /// Sets the result bucket.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the target database.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Reads statements from `dir` instead of the embedded copies.
    #[must_use]
    pub fn with_sql_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sql_dir = Some(dir.into());
        self
    }

    /// Sets the engine endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the polling schedule.
    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Location where the engine writes query results.
    #[must_use]
    pub fn output_location(&self) -> String {
        format!("s3://{}/athena_results/", self.bucket)
    }

    /// Engine endpoint requests are sent to.
    ///
    /// Requests leave this crate unsigned, so there is no usable default: the
    /// endpoint must be a signing proxy or an emulator.
    pub fn engine_endpoint(&self) -> Result<&str, WarehouseError> {
        match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => Ok(endpoint),
            _ => Err(WarehouseError::Config(format!(
                "no engine endpoint configured: requests are sent unsigned, so set \
                 ATHENA_ENDPOINT or --endpoint to a SigV4 signing proxy for \
                 athena.{}.amazonaws.com or to a local emulator",
                self.region
            ))),
        }
    }

    /// Checks the settings a run depends on.
    pub fn validate(&self) -> Result<(), WarehouseError> {
        self.poll.validate()
    }
}
