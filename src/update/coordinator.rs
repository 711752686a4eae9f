use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use super::{RegistrationEvent, UpdateState, UpdateStateMachine, WorkerMessage, WorkerRegistration};
use crate::error::Result;
use crate::liveness::LiveState;

/// Bridges registration lifecycle events to an [`UpdateState`] signal.
pub struct UpdateCoordinator;

impl UpdateCoordinator {
    /// Subscribe to `registration` and start tracking updates. With `None`
    /// (no worker capability in the runtime) the coordinator stays inert in
    /// [`UpdateState::NoUpdate`]. Must be called from within a tokio runtime.
    pub fn start(registration: Option<Arc<dyn WorkerRegistration>>) -> UpdateCoordinatorHandle {
        let shared = Arc::new(Shared {
            registration,
            machine: Mutex::new(UpdateStateMachine::new()),
            state: LiveState::new(UpdateState::NoUpdate),
        });

        match &shared.registration {
            Some(registration) => {
                // Subscribe before returning so no event sent after start is missed.
                let events = registration.subscribe();
                tokio::spawn(Arc::clone(&shared).listen(events));
            }
            None => debug!("No background worker capability, update coordinator inert"),
        }

        UpdateCoordinatorHandle { shared }
    }
}

struct Shared {
    registration: Option<Arc<dyn WorkerRegistration>>,
    machine: Mutex<UpdateStateMachine>,
    state: LiveState<UpdateState>,
}

impl Shared {
    async fn listen(self: Arc<Self>, mut events: broadcast::Receiver<RegistrationEvent>) {
        let token = self.state.scope().clone();
        loop {
            let event = tokio::select! {
                _ = token.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Ok(event) => self.handle(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Update coordinator lagged behind registration events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Registration event stream closed");
                    break;
                }
            }
        }
        // Dropping `events` here unsubscribes from the registration.
    }

    fn handle(&self, event: RegistrationEvent) {
        if !self.state.is_live() {
            return;
        }
        let Some(registration) = self.registration.as_ref() else {
            return;
        };
        if event == RegistrationEvent::UpdateFound {
            if let Some(worker) = registration.installing() {
                debug!(state = ?worker.state(), "New worker instance installing");
            }
        }
        let controller_active = registration.has_controller();

        let mut machine = self.machine.lock();
        if machine.on_event(event, controller_active) {
            let next = machine.state();
            if self.state.update(|state| *state = next) {
                info!(?event, "Application update available");
            }
        } else {
            debug!(?event, controller_active, "Registration event");
        }
    }
}

/// Owner of a running coordinator; also the registration handle holder.
pub struct UpdateCoordinatorHandle {
    shared: Arc<Shared>,
}

impl UpdateCoordinatorHandle {
    pub fn state(&self) -> UpdateState {
        self.shared.state.snapshot()
    }

    pub fn update_available(&self) -> bool {
        self.state() == UpdateState::UpdateAvailable
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.shared.state.subscribe()
    }

    /// Whether the runtime offers a worker registration at all.
    pub fn is_supported(&self) -> bool {
        self.shared.registration.is_some()
    }

    pub fn registration(&self) -> Option<&Arc<dyn WorkerRegistration>> {
        self.shared.registration.as_ref()
    }

    /// Ask the waiting worker, if any, to activate and clear the pending
    /// signal. Returns whether a message was sent. Reloading is left to the
    /// caller, see [`UpdatePrompt`](super::UpdatePrompt).
    pub fn update_service_worker(&self) -> Result<bool> {
        let waiting = self
            .shared
            .registration
            .as_ref()
            .and_then(|registration| registration.waiting());

        let sent = match waiting {
            Some(worker) => {
                worker.post_message(&WorkerMessage::SkipWaiting)?;
                info!(state = ?worker.state(), "Sent skip-waiting to waiting worker");
                true
            }
            None => {
                debug!("No waiting worker to activate");
                false
            }
        };

        let mut machine = self.shared.machine.lock();
        if machine.clear() {
            self.shared.state.update(|state| *state = UpdateState::NoUpdate);
        }
        Ok(sent)
    }

    /// Stop listening. The signal is frozen from here on.
    pub fn teardown(&self) {
        self.shared.state.teardown();
    }
}

impl Drop for UpdateCoordinatorHandle {
    fn drop(&mut self) {
        self.shared.state.teardown();
    }
}
