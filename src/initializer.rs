//! Startup initialization with bounded retries.
//!
//! An [`Initializer`] runs a consumer-supplied async procedure once on
//! activation. Failed attempts are retried up to `max_retries` times with a
//! linear backoff of `retry_delay * retry_count`. Progress is published as an
//! [`InitializationState`] that the presentation layer can poll or await.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::liveness::LiveState;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Asynchronous startup procedure.
#[async_trait]
pub trait Initialize: Send + Sync + 'static {
    async fn initialize(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> Initialize for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn initialize(&self) -> anyhow::Result<()> {
        (self)().await
    }
}

pub type SuccessCallback = Arc<dyn Fn() + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

/// Retry policy and observer callbacks.
#[derive(Clone)]
pub struct InitializerConfig {
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Invoked once when an attempt succeeds
    pub on_success: Option<SuccessCallback>,
    /// Invoked after every failed attempt
    pub on_error: Option<ErrorCallback>,
}

impl InitializerConfig {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Delay before the `retry_count`-th retry.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.retry_delay.saturating_mul(retry_count)
    }
}

impl Default for InitializerConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
            on_success: None,
            on_error: None,
        }
    }
}

impl fmt::Debug for InitializerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerConfig")
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Observable progress of an initializer.
#[derive(Debug, Clone)]
pub struct InitializationState {
    pub is_initialized: bool,
    pub is_loading: bool,
    pub error: Option<Arc<Error>>,
    pub retry_count: u32,
}

impl InitializationState {
    /// State at activation: loading, nothing attempted yet.
    pub fn pending() -> Self {
        Self {
            is_initialized: false,
            is_loading: true,
            error: None,
            retry_count: 0,
        }
    }

    /// True once the loop has stopped without succeeding.
    pub fn is_failed(&self) -> bool {
        !self.is_loading && !self.is_initialized
    }
}

impl Default for InitializationState {
    fn default() -> Self {
        Self::pending()
    }
}

/// Entry point for running a startup procedure.
pub struct Initializer;

impl Initializer {
    /// Start running `procedure` immediately. Must be called from within a
    /// tokio runtime. Dropping the returned handle tears the run down.
    pub fn activate<I: Initialize>(procedure: I, config: InitializerConfig) -> InitializerHandle {
        let state = Arc::new(LiveState::new(InitializationState::pending()));
        let run = state.scope().child_token();
        let handle = InitializerHandle {
            procedure: Arc::new(procedure),
            config,
            state,
            run: Mutex::new(run.clone()),
        };
        handle.spawn(run);
        handle
    }
}

/// Owner of a running initializer; holds the liveness scope.
pub struct InitializerHandle {
    procedure: Arc<dyn Initialize>,
    config: InitializerConfig,
    state: Arc<LiveState<InitializationState>>,
    run: Mutex<CancellationToken>,
}

impl InitializerHandle {
    pub fn state(&self) -> InitializationState {
        self.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<InitializationState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &InitializerConfig {
        &self.config
    }

    /// Reset to the activation state without running the procedure again.
    ///
    /// A run that is still retrying keeps going and may overwrite the reset
    /// state. Use [`retry`](Self::retry) to restart the procedure.
    pub fn reset(&self) {
        self.state.update(|s| *s = InitializationState::pending());
    }

    /// Reset the state and start a fresh run of the same procedure,
    /// abandoning any run still in progress.
    pub fn retry(&self) {
        let mut run = self.run.lock();
        let next = self.state.scope().child_token();
        let previous = run.clone();
        let reset = self.state.update(|s| {
            previous.cancel();
            *s = InitializationState::pending();
        });
        if !reset {
            debug!("Initializer already torn down, ignoring retry");
            return;
        }
        *run = next.clone();
        info!("Restarting initialization");
        self.spawn(next);
    }

    /// Stop publishing state. Pending retries are abandoned and results of
    /// in-flight attempts are discarded.
    pub fn teardown(&self) {
        self.state.teardown();
    }

    pub fn is_torn_down(&self) -> bool {
        !self.state.is_live()
    }

    /// Wait until the current run stops loading, or until teardown.
    pub async fn wait_settled(&self) -> InitializationState {
        let mut rx = self.state.subscribe();
        let scope = self.state.scope().clone();
        tokio::select! {
            _ = scope.cancelled() => {}
            _ = rx.wait_for(|s| !s.is_loading) => {}
        }
        self.state()
    }

    fn spawn(&self, token: CancellationToken) {
        let procedure = Arc::clone(&self.procedure);
        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(run_attempts(procedure, config, state, token));
    }
}

impl Drop for InitializerHandle {
    fn drop(&mut self) {
        self.state.teardown();
    }
}

async fn run_attempts(
    procedure: Arc<dyn Initialize>,
    config: InitializerConfig,
    state: Arc<LiveState<InitializationState>>,
    token: CancellationToken,
) {
    let mut retry_count = 0u32;

    loop {
        let attempt = retry_count + 1;
        debug!(attempt, "Running initializer");
        let result = procedure.initialize().await;

        if token.is_cancelled() {
            debug!(attempt, "Initializer torn down, discarding attempt result");
            return;
        }

        let err = match result {
            Ok(()) => {
                let applied = state.update_with(&token, |s| {
                    s.is_initialized = true;
                    s.is_loading = false;
                    s.error = None;
                });
                if applied {
                    info!(attempt, "Initialization succeeded");
                    if let Some(on_success) = &config.on_success {
                        on_success();
                    }
                }
                return;
            }
            Err(err) => Arc::new(Error::initialization(attempt, &err)),
        };

        warn!(attempt, error = %err, "Initialization attempt failed");
        if let Some(on_error) = &config.on_error {
            on_error(err.as_ref());
        }

        if retry_count >= config.max_retries {
            let applied = state.update_with(&token, |s| {
                s.error = Some(Arc::clone(&err));
                s.is_loading = false;
            });
            if applied {
                error!(
                    attempts = attempt,
                    max_retries = config.max_retries,
                    "Initialization failed permanently"
                );
            }
            return;
        }

        retry_count += 1;
        let applied = state.update_with(&token, |s| {
            s.error = Some(Arc::clone(&err));
            s.retry_count = retry_count;
        });
        if !applied {
            return;
        }

        let delay = config.delay_for(retry_count);
        debug!(retry_count, delay_ms = delay.as_millis() as u64, "Scheduling initialization retry");
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Initializer torn down while waiting to retry");
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
