//! dbscaled — the dbscale daemon.
//!
//! Single binary that wires the autoscaler to its collaborators:
//! - Kubernetes pod lister (usage annotations)
//! - Aurora Serverless capacity applier (RDS API, or dry run)
//! - Reconciliation loop with downscale cooldown
//!
//! # Usage
//!
//! ```text
//! dbscaled run            # reads PODS_LABEL_SELECTOR, SCALINGS_SET, ... from the environment
//! dbscaled check-config   # validate and print the effective configuration
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

mod applier;
mod daemon;

#[derive(Parser)]
#[command(
    name = "dbscaled",
    about = "Scales an Aurora Serverless cluster from pod connection usage",
    version
)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text", env = "LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the autoscaler until interrupted.
    Run(ConfigArgs),
    /// Validate the configuration and print it, without contacting any API.
    CheckConfig(ConfigArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Autoscaler settings. Every flag falls back to its environment variable.
#[derive(Args, Debug, Clone)]
pub(crate) struct ConfigArgs {
    /// Label selector for pods that report connection usage.
    #[arg(long, env = "PODS_LABEL_SELECTOR", default_value = "")]
    pub pods_label_selector: String,

    /// Connections added on top of the reported usage.
    #[arg(long, env = "CONNECTIONS_HEADROOM", default_value = "0")]
    pub connections_headroom: u64,

    /// Tier catalogue as JSON: [{"Scale":"1","ConnectionLimit":100}, ...].
    #[arg(long, env = "SCALINGS_SET")]
    pub scalings_set: String,

    /// Seconds before a capacity change is forced through.
    #[arg(long, env = "OPERATION_TIMEOUT", default_value = "300")]
    pub operation_timeout: u64,

    /// Aurora cluster identifier.
    #[arg(long, env = "DB_IDENTIFIER")]
    pub db_identifier: String,

    /// Seconds after a change during which downscales are suppressed.
    #[arg(long, env = "DOWNSCALE_FORBIDDEN_WINDOW_SECONDS", default_value = "600")]
    pub downscale_forbidden_window_seconds: u64,

    /// Idle seconds between reconciliation cycles.
    #[arg(long, env = "SYNC_INTERVAL_SECONDS", default_value = "30")]
    pub sync_interval_seconds: u64,

    /// Kubernetes API URL. Defaults to the in-cluster service account,
    /// then the local kubeconfig.
    #[arg(long, env = "KUBE_API_URL")]
    pub kube_api_url: Option<String>,

    /// Log capacity changes instead of applying them.
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    match cli.command {
        Command::Run(args) => daemon::run(args).await,
        Command::CheckConfig(args) => daemon::check_config(&args),
    }
}

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,dbscaled=debug,dbscale=debug"))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}
