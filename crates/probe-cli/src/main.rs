use std::path::PathBuf;

use clap::{Parser, Subcommand};
use probe_core::{CheckOutcome, ReportLine};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::{ProbesConfig, DEFAULT_CONFIG_PATH};

/// Label used for failures that happen before any probe runs.
const SETUP_LABEL: &str = "statusprobe";

#[derive(Parser)]
#[command(
    name = "statusprobe",
    about = "Health checks for MinIO, Rancher and Traefiker in check_mk local format",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Probe configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Log probe activity at debug level on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check MinIO cluster health and bucket usage through `mc`
    Minio {
        /// Config section to run (repeatable; default: all [minio.*])
        #[arg(short, long)]
        section: Vec<String>,
    },
    /// Check Rancher agents and the services of one stack
    Rancher {
        /// Config section to run (repeatable; default: all [rancher.*])
        #[arg(short, long)]
        section: Vec<String>,
    },
    /// Check Traefiker narrative services
    Traefiker {
        /// Config section to run (repeatable; default: all [traefiker.*])
        #[arg(short, long)]
        section: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match run(&cli).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %format!("{e:#}"), "probe setup failed");
            CheckOutcome {
                lines: vec![ReportLine::unknown(SETUP_LABEL, format!("{e:#}"))],
            }
        }
    };

    if !outcome.lines.is_empty() {
        println!("{}", outcome.render());
    }
    std::process::exit(outcome.exit_code());
}

async fn run(cli: &Cli) -> anyhow::Result<CheckOutcome> {
    let config = ProbesConfig::from_file(&cli.config)?;
    match &cli.command {
        Commands::Minio { section } => commands::minio::check(&config, section).await,
        Commands::Rancher { section } => commands::rancher::check(&config, section).await,
        Commands::Traefiker { section } => commands::traefiker::check(&config, section).await,
    }
}

/// Logs go to stderr so stdout carries only report lines.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,probe_core=debug,probe_minio=debug,probe_rancher=debug,probe_traefiker=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
