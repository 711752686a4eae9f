//! vagas-pwa binary.
//!
//! Operator entry point for the client resilience core: probes the hosted
//! backend with startup retries and watches the local cache store.

use clap::Parser;
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use vagas_pwa_core::cli::{
    commands::Commands,
    handlers::{handle_config, handle_monitor, handle_probe},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging = cli.command.logging();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(logging.get_effective_level()).into())
                .parse_lossy(logging.log_filter.as_deref().unwrap_or("")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("vagas-pwa starting up");

    match cli.command {
        Commands::Probe(cmd) => handle_probe(cmd).await?,
        Commands::Monitor(cmd) => handle_monitor(cmd).await?,
        Commands::Config(cmd) => handle_config(cmd)?,
    }

    Ok(())
}
