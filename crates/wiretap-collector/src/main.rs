//! Wiretap collector - receives captured HTTP exchanges from instrumented clients.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use observability::{LogConfig, LogFormat};
use std::path::PathBuf;
use wiretap_collector::{CollectorConfig, DEFAULT_HOST, DEFAULT_MAX_ENTRIES, DEFAULT_PORT};

/// Wiretap collector command-line interface.
#[derive(Parser)]
#[command(name = "wiretap-collector")]
#[command(about = "Collector for HTTP exchanges captured by wiretap clients")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true, env = "WIRETAP_LOG_LEVEL")]
    log_level: String,

    /// Log output format (compact, json)
    #[arg(long, default_value = "compact", global = true, env = "WIRETAP_LOG_FORMAT")]
    log_format: LogFormat,

    /// Append JSON logs to this file (with --log-format json), mirroring to stderr
    #[arg(long, global = true, env = "WIRETAP_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the collector (default)
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Host to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to bind to
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Captures kept in memory before the oldest are evicted
    #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES)]
    max_entries: usize,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    observability::init_with_config(LogConfig {
        service_name: "wiretap-collector".into(),
        default_level: cli.log_level.clone(),
        format: cli.log_format,
        also_stderr: cli.log_file.is_some(),
        log_path: cli.log_file.clone(),
    })
    .context("failed to initialize logging")?;

    // Default to run if no command given
    let Commands::Run(args) = cli.command.unwrap_or(Commands::Run(RunArgs::default()));

    let config = CollectorConfig {
        host: args.host,
        port: args.port,
        max_entries: args.max_entries,
    };

    wiretap_collector::run(config)
        .await
        .context("collector failed")?;

    Ok(())
}
