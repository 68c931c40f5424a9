use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::Parser;
use starbuild::config::{PollConfig, WarehouseConfig};
use starbuild::events::LoggingEventSink;
use starbuild::observability::{init_logging, LogFormat};
use starbuild::pipeline::PipelineOrchestrator;

#[derive(Parser, Debug)]
#[command(
    name = "starbuild",
    version,
    about = "Build the star-schema claims warehouse on Athena"
)]
struct Cli {
    /// Stage to run: views, dims, facts, validate or all
    #[arg(long, default_value = "all")]
    step: String,

    /// Invocation payload such as '{"step": "dims"}'; overrides --step
    #[arg(long, conflicts_with = "step")]
    event: Option<String>,

    /// Bucket receiving query results
    #[arg(long, env = "AWS_BUCKET")]
    bucket: Option<String>,

    /// Engine region
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Target database
    #[arg(long, env = "AWS_DATABASE")]
    database: Option<String>,

    /// Read statements from this directory instead of the built-in ones
    #[arg(long, env = "SQL_DIR")]
    sql_dir: Option<PathBuf>,

    /// Engine URL: a SigV4 signing proxy or local emulator (requests are sent unsigned)
    #[arg(long, env = "ATHENA_ENDPOINT")]
    endpoint: Option<String>,

    /// Milliseconds between status polls
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Status polls before a statement times out
    #[arg(long)]
    max_poll_attempts: Option<usize>,

    /// Debug-level logging for the build; `--verbose` alone means true
    #[arg(
        long,
        env = "VERBOSE",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    verbose: Option<bool>,

    /// Log output format (pretty, json)
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

impl Cli {
    fn config(&self) -> WarehouseConfig {
        let mut config = WarehouseConfig::new();
        if let Some(bucket) = &self.bucket {
            config = config.with_bucket(bucket);
        }
        if let Some(region) = &self.region {
            config = config.with_region(region);
        }
        if let Some(database) = &self.database {
            config = config.with_database(database);
        }
        if let Some(dir) = &self.sql_dir {
            config = config.with_sql_dir(dir);
        }
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }

        let mut poll = PollConfig::default();
        if let Some(interval_ms) = self.poll_interval_ms {
            poll = poll.with_interval_ms(interval_ms);
        }
        if let Some(max_attempts) = self.max_poll_attempts {
            poll = poll.with_max_attempts(max_attempts);
        }
        config.with_poll(poll)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.config();

    init_logging(cli.log_format, config.verbose);

    let orchestrator =
        PipelineOrchestrator::connect(&config)?.with_events(Arc::new(LoggingEventSink::default()));
    tracing::info!(
        endpoint = %config.engine_endpoint()?,
        database = %config.database,
        output_location = %config.output_location(),
        "Claims warehouse build"
    );

    let report = match &cli.event {
        Some(raw) => {
            let event: serde_json::Value =
                serde_json::from_str(raw).context("--event is not valid JSON")?;
            orchestrator.handle_event(&event).await
        }
        None => orchestrator.run_step(&cli.step).await,
    };

    println!("{}", report.to_json_pretty()?);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
