//! buildevents CLI: replay recorded host lifecycles and check configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use buildevents::config::Config;
use buildevents::dispatch::HttpEventSink;
use buildevents::replay::{Replayer, parse_events};
use buildevents::telemetry::{TelemetryConfig, init_telemetry};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "buildevents", about = "Consolidated build events for CI runs")]
struct Cli {
    /// TOML config file; environment variables are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a newline-delimited lifecycle event log through the engine
    Replay {
        /// Event log to replay
        file: PathBuf,
        /// Maximum runs replayed concurrently
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
    /// Validate the collector configuration
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Command::Replay { file, concurrency } => cmd_replay(config, file, concurrency).await,
        Command::CheckConfig => {
            println!("endpoint:  {}", config.endpoint.url);
            println!(
                "telemetry: {}",
                config.otel_endpoint.as_deref().unwrap_or("stderr only")
            );
            println!("log level: {}", config.log_level);
            Ok(())
        }
    }
}

async fn cmd_replay(config: Config, file: PathBuf, concurrency: usize) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "buildevents".to_string(),
        default_level: config.log_level.clone(),
    })?;

    let events = parse_events(BufReader::new(File::open(&file)?))?;

    // The blocking HTTP client must be created and dropped off the async
    // worker threads.
    let sink = tokio::task::spawn_blocking(HttpEventSink::new).await??;
    let replayer = Arc::new(Replayer::new(Arc::new(sink), Arc::new(config)));

    let report = replayer.replay(events, concurrency).await;
    tokio::task::spawn_blocking(move || drop(replayer)).await?;

    println!("completed runs: {}", report.completed);
    if !report.failures.is_empty() {
        println!("failed hooks:   {}", report.failures.len());
        for failure in &report.failures {
            println!("  {failure}");
        }
        anyhow::bail!("{} hook invocation(s) failed", report.failures.len());
    }
    Ok(())
}
