use clap::{ArgAction, Args};
use tracing::Level;

use crate::config::ConfigArgs;

/// Logging flags shared by every subcommand
#[derive(Debug, Default, Args)]
pub struct LoggingOptions {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Explicit log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Tracing filter directives, e.g. "vagas_pwa_core=trace"
    #[arg(long, env = "VAGAS_PWA_LOG")]
    pub log_filter: Option<String>,
}

impl LoggingOptions {
    /// Level used as the default filter directive
    pub fn get_effective_level(&self) -> Level {
        if let Some(level) = self.log_level.as_deref().and_then(|l| l.parse().ok()) {
            return level;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub logging: LoggingOptions,
}
