use clap::Args;

use super::LoggingOptions;
use crate::config::ConfigArgs;

#[derive(Args)]
pub struct MonitorCommand {
    /// Stop after this many stats updates instead of waiting for Ctrl-C
    #[arg(long)]
    pub updates: Option<u64>,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub logging: LoggingOptions,
}
