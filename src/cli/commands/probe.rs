use clap::Args;

use super::LoggingOptions;
use crate::config::ConfigArgs;

#[derive(Args)]
pub struct ProbeCommand {
    /// Backend address in host:port format
    #[arg(value_name = "HOST:PORT")]
    pub addr: String,

    /// Timeout for each connection attempt in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub connect_timeout_ms: u64,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub logging: LoggingOptions,
}
