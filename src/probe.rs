//! Reachability check for the hosted backend, used as a startup procedure.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use crate::initializer::Initialize;

/// Default time allowed for a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Succeeds once a TCP connection to `addr` can be opened.
#[derive(Debug, Clone)]
pub struct BackendProbe {
    addr: String,
    connect_timeout: Duration,
}

impl BackendProbe {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl Initialize for BackendProbe {
    async fn initialize(&self) -> anyhow::Result<()> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .with_context(|| format!("timed out after {:?} connecting to {}", self.connect_timeout, self.addr))?
            .with_context(|| format!("failed to connect to {}", self.addr))?;

        debug!(addr = %self.addr, peer = ?stream.peer_addr().ok(), "Backend reachable");
        Ok(())
    }
}
