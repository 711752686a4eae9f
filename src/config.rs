//! Configuration management for the vagas client resilience core.
//!
//! Configuration is loaded from, in order of increasing precedence:
//! 1. Default configuration (embedded in binary)
//! 2. System-wide configuration file (`/etc/vagas-pwa/config.toml`)
//! 3. User-specified configuration file
//! 4. Environment variables (prefixed with `VAGAS_PWA`, sections separated by `__`)
//! 5. Command-line arguments
//!
//! For example `VAGAS_PWA__INITIALIZER__MAX_RETRIES=5` raises the retry budget.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::initializer::InitializerConfig;

/// Command-line overrides shared by every subcommand
#[derive(Debug, Default, Args)]
pub struct ConfigArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Retries after the first failed initialization attempt
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base retry delay in milliseconds (multiplied by the retry number)
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Cache poll interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Directory holding the cache entries
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Cache storage quota in bytes
    #[arg(long)]
    pub quota_bytes: Option<u64>,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub initializer: InitializerSettings,
    #[serde(default)]
    pub cache_monitor: CacheMonitorSettings,
}

/// Startup retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializerSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for InitializerSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl InitializerSettings {
    /// Retry policy without callbacks; attach them with the builder methods.
    pub fn to_config(&self) -> InitializerConfig {
        InitializerConfig::default()
            .with_max_retries(self.max_retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
    }
}

/// Cache monitoring settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMonitorSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// 0 disables the usage percentage
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
}

impl Default for CacheMonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            cache_dir: default_cache_dir(),
            quota_bytes: default_quota_bytes(),
        }
    }
}

impl CacheMonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ServiceConfig {
    /// Load configuration from all sources
    pub fn load(args: &ConfigArgs) -> Result<Self> {
        let mut config = Self::load_files(args.config.as_deref(), Some("/etc/vagas-pwa/config.toml"))?;
        config.apply_args(args);
        Ok(config)
    }

    fn load_files(user: Option<&Path>, system: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("../config/default.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(system) = system {
            builder = builder.add_source(config::File::with_name(system).required(false));
        }

        // Load user config if specified
        if let Some(path) = user {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(config::Environment::with_prefix("VAGAS_PWA").separator("__"));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Override with command line args
    pub fn apply_args(&mut self, args: &ConfigArgs) {
        if let Some(max_retries) = args.max_retries {
            self.initializer.max_retries = max_retries;
        }
        if let Some(delay) = args.retry_delay_ms {
            self.initializer.retry_delay_ms = delay;
        }
        if let Some(interval) = args.interval_ms {
            self.cache_monitor.poll_interval_ms = interval;
        }
        if let Some(dir) = &args.cache_dir {
            self.cache_monitor.cache_dir = dir.clone();
        }
        if let Some(quota) = args.quota_bytes {
            self.cache_monitor.quota_bytes = quota;
        }
    }
}

fn default_max_retries() -> u32 {
    crate::initializer::DEFAULT_MAX_RETRIES
}

fn default_retry_delay_ms() -> u64 {
    crate::initializer::DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_poll_interval_ms() -> u64 {
    crate::cache::DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".cache/vagas")
}

fn default_quota_bytes() -> u64 {
    50 * 1024 * 1024
}
