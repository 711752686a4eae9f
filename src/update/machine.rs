use serde::Serialize;

use super::{RegistrationEvent, WorkerState};

/// Whether a new version is ready for the user to activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UpdateState {
    #[default]
    NoUpdate,
    UpdateAvailable,
}

/// Pure transition logic for update detection.
///
/// An installed worker only counts as an update when a controller was
/// already active; otherwise it is the first install.
#[derive(Debug, Default)]
pub struct UpdateStateMachine {
    state: UpdateState,
    tracking_install: bool,
}

impl UpdateStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Feed one event. `controller_active` is sampled when the event is
    /// delivered. Returns true only on the NoUpdate -> UpdateAvailable edge.
    pub fn on_event(&mut self, event: RegistrationEvent, controller_active: bool) -> bool {
        match event {
            RegistrationEvent::UpdateFound => {
                self.tracking_install = true;
                false
            }
            RegistrationEvent::InstallingStateChanged(WorkerState::Installed) if self.tracking_install => {
                self.tracking_install = false;
                controller_active && self.signal()
            }
            RegistrationEvent::InstallingStateChanged(WorkerState::Redundant) => {
                self.tracking_install = false;
                false
            }
            RegistrationEvent::InstallingStateChanged(_) => false,
            RegistrationEvent::ControllerChanged => self.signal(),
        }
    }

    /// Explicit user action. Returns true if an update was pending.
    pub fn clear(&mut self) -> bool {
        let was_available = self.state == UpdateState::UpdateAvailable;
        self.state = UpdateState::NoUpdate;
        was_available
    }

    fn signal(&mut self) -> bool {
        if self.state == UpdateState::UpdateAvailable {
            return false;
        }
        self.state = UpdateState::UpdateAvailable;
        true
    }
}
