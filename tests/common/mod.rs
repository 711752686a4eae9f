//! Common test utilities: in-memory stand-ins for runtime-owned resources.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use vagas_pwa_core::error::{Error, Result};
use vagas_pwa_core::update::{RegistrationEvent, WorkerHandle, WorkerMessage, WorkerRegistration, WorkerState};
use vagas_pwa_core::CacheStore;

/// Cache store returning fixed answers, optionally failing.
pub struct StaticCacheStore {
    pub size: Mutex<u64>,
    pub usage: Mutex<f64>,
    pub fail: AtomicBool,
    pub queries: AtomicU32,
}

impl StaticCacheStore {
    pub fn new(size: u64, usage: f64) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(size),
            usage: Mutex::new(usage),
            fail: AtomicBool::new(false),
            queries: AtomicU32::new(0),
        })
    }

    pub fn set(&self, size: u64, usage: f64) {
        *self.size.lock() = size;
        *self.usage.lock() = usage;
    }
}

#[async_trait::async_trait]
impl CacheStore for StaticCacheStore {
    async fn cache_size(&self) -> Result<u64> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::CacheQuery("storage estimate unavailable".into()));
        }
        Ok(*self.size.lock())
    }

    async fn usage_percent(&self) -> Result<f64> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::CacheQuery("storage estimate unavailable".into()));
        }
        Ok(*self.usage.lock())
    }
}

/// Worker instance that records the messages posted to it.
pub struct FakeWorker {
    pub state: Mutex<WorkerState>,
    pub inbox: Mutex<Vec<WorkerMessage>>,
}

impl FakeWorker {
    pub fn new(state: WorkerState) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            inbox: Mutex::new(Vec::new()),
        })
    }
}

impl WorkerHandle for FakeWorker {
    fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    fn post_message(&self, message: &WorkerMessage) -> Result<()> {
        self.inbox.lock().push(message.clone());
        Ok(())
    }
}

/// Registration driven by the test through `emit`.
pub struct FakeRegistration {
    pub controller: AtomicBool,
    pub installing: Mutex<Option<Arc<FakeWorker>>>,
    pub waiting: Mutex<Option<Arc<FakeWorker>>>,
    events: broadcast::Sender<RegistrationEvent>,
}

impl FakeRegistration {
    pub fn new(controller: bool) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            controller: AtomicBool::new(controller),
            installing: Mutex::new(None),
            waiting: Mutex::new(None),
            events,
        })
    }

    pub fn emit(&self, event: RegistrationEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Simulate a full install of a new worker that ends up waiting.
    pub fn install_new_worker(&self) -> Arc<FakeWorker> {
        let worker = FakeWorker::new(WorkerState::Installing);
        *self.installing.lock() = Some(Arc::clone(&worker));
        self.emit(RegistrationEvent::UpdateFound);
        self.emit(RegistrationEvent::InstallingStateChanged(WorkerState::Installing));

        *worker.state.lock() = WorkerState::Installed;
        *self.installing.lock() = None;
        *self.waiting.lock() = Some(Arc::clone(&worker));
        self.emit(RegistrationEvent::InstallingStateChanged(WorkerState::Installed));
        worker
    }
}

impl WorkerRegistration for FakeRegistration {
    fn has_controller(&self) -> bool {
        self.controller.load(Ordering::SeqCst)
    }

    fn installing(&self) -> Option<Arc<dyn WorkerHandle>> {
        self.installing.lock().clone().map(|w| w as Arc<dyn WorkerHandle>)
    }

    fn waiting(&self) -> Option<Arc<dyn WorkerHandle>> {
        self.waiting.lock().clone().map(|w| w as Arc<dyn WorkerHandle>)
    }

    fn subscribe(&self) -> broadcast::Receiver<RegistrationEvent> {
        self.events.subscribe()
    }
}
