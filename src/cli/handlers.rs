use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use crate::cache::{CacheMonitor, FsCacheStore};
use crate::cli::commands::{ConfigCommand, MonitorCommand, ProbeCommand};
use crate::config::ServiceConfig;
use crate::initializer::Initializer;
use crate::probe::BackendProbe;

/// Run the backend probe under the configured retry policy.
pub async fn handle_probe(cmd: ProbeCommand) -> Result<()> {
    let config = ServiceConfig::load(&cmd.config).context("Failed to load configuration")?;

    let probe = BackendProbe::new(cmd.addr.clone())
        .with_connect_timeout(Duration::from_millis(cmd.connect_timeout_ms));
    let init_config = config
        .initializer
        .to_config()
        .on_error(|err| warn!("Backend probe attempt failed: {}", err))
        .on_success(|| info!("Backend probe succeeded"));

    info!(
        addr = %cmd.addr,
        max_retries = init_config.max_retries,
        retry_delay = ?init_config.retry_delay,
        "Probing backend"
    );
    let handle = Initializer::activate(probe, init_config);

    let state = tokio::select! {
        state = handle.wait_settled() => state,
        _ = tokio::signal::ctrl_c() => {
            handle.teardown();
            bail!("Probe interrupted");
        }
    };

    if state.is_initialized {
        info!(retries = state.retry_count, "Backend {} is ready", cmd.addr);
        return Ok(());
    }

    match state.error {
        Some(err) => {
            error!("Backend {} unavailable after {} retries", cmd.addr, state.retry_count);
            bail!("{}", err)
        }
        None => bail!("Backend {} unavailable", cmd.addr),
    }
}

/// Poll the cache directory and log every stats change.
pub async fn handle_monitor(cmd: MonitorCommand) -> Result<()> {
    let config = ServiceConfig::load(&cmd.config).context("Failed to load configuration")?;
    let settings = &config.cache_monitor;

    let store = FsCacheStore::new(&settings.cache_dir, settings.quota_bytes);
    info!(
        cache_dir = %settings.cache_dir.display(),
        quota_bytes = settings.quota_bytes,
        "Monitoring cache"
    );
    let handle = CacheMonitor::new(std::sync::Arc::new(store), settings.poll_interval()).start();
    let mut stats_rx = handle.subscribe();
    let mut seen = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, stopping cache monitor");
                break;
            }
            changed = stats_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let stats = stats_rx.borrow_and_update().clone();
                info!(
                    size = stats.size,
                    usage_percent = stats.usage_percent,
                    hit_rate = stats.hit_rate,
                    miss_rate = stats.miss_rate,
                    "Cache stats"
                );
                seen += 1;
                if cmd.updates.map_or(false, |limit| seen >= limit) {
                    break;
                }
            }
        }
    }

    handle.stop();
    Ok(())
}

/// Print the effective configuration as JSON.
pub fn handle_config(cmd: ConfigCommand) -> Result<()> {
    let config = ServiceConfig::load(&cmd.config).context("Failed to load configuration")?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
