pub mod config;
pub mod monitor;
pub mod probe;

pub use config::{ConfigCommand, LoggingOptions};
pub use monitor::MonitorCommand;
pub use probe::ProbeCommand;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the hosted backend is reachable, retrying with backoff
    Probe(ProbeCommand),
    /// Watch a cache directory and log size, usage and hit rates
    Monitor(MonitorCommand),
    /// Print the effective configuration
    Config(ConfigCommand),
}

impl Commands {
    pub fn logging(&self) -> &LoggingOptions {
        match self {
            Commands::Probe(cmd) => &cmd.logging,
            Commands::Monitor(cmd) => &cmd.logging,
            Commands::Config(cmd) => &cmd.logging,
        }
    }
}
