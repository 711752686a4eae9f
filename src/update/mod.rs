//! Background-worker update coordination.
//!
//! The runtime owns the worker registration; this module only observes its
//! lifecycle events and issues the skip-waiting command. Transition logic is
//! kept in [`UpdateStateMachine`], which has no I/O, while
//! [`UpdateCoordinator`] wires it to a live registration.

pub mod coordinator;
pub mod machine;
pub mod prompt;

pub use coordinator::{UpdateCoordinator, UpdateCoordinatorHandle};
pub use machine::{UpdateState, UpdateStateMachine};
pub use prompt::{Reload, UpdatePrompt};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::Result;

/// Lifecycle state of a single worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

/// Events emitted by a registration and the runtime around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// A new worker instance started installing
    UpdateFound,
    /// The installing instance moved to a new state
    InstallingStateChanged(WorkerState),
    /// The active controller was handed over to another instance
    ControllerChanged,
}

/// Commands accepted by a worker instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    /// Activate immediately instead of waiting for all clients to close
    SkipWaiting,
}

impl WorkerMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A worker instance the runtime exposes on a registration.
pub trait WorkerHandle: Send + Sync {
    fn state(&self) -> WorkerState;

    fn post_message(&self, message: &WorkerMessage) -> Result<()>;
}

/// Runtime-owned background-worker registration.
pub trait WorkerRegistration: Send + Sync {
    /// Whether a worker currently controls the page
    fn has_controller(&self) -> bool;

    /// Instance being installed, if any
    fn installing(&self) -> Option<Arc<dyn WorkerHandle>>;

    /// Instance installed and waiting to activate, if any
    fn waiting(&self) -> Option<Arc<dyn WorkerHandle>>;

    /// Subscribe to lifecycle events. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<RegistrationEvent>;
}
