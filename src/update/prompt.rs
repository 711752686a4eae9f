//! UI-facing wrapper that pairs activation with a forced reload.

use tracing::info;

use super::UpdateCoordinatorHandle;
use crate::error::Result;

/// Reloads the host so it picks up the newly activated version.
pub trait Reload: Send + Sync {
    fn reload(&self);
}

impl<F> Reload for F
where
    F: Fn() + Send + Sync,
{
    fn reload(&self) {
        self()
    }
}

pub struct UpdatePrompt<R: Reload> {
    coordinator: UpdateCoordinatorHandle,
    reloader: R,
}

impl<R: Reload> UpdatePrompt<R> {
    pub fn new(coordinator: UpdateCoordinatorHandle, reloader: R) -> Self {
        Self { coordinator, reloader }
    }

    pub fn coordinator(&self) -> &UpdateCoordinatorHandle {
        &self.coordinator
    }

    /// Whether the "new version available" prompt should be shown.
    pub fn should_prompt(&self) -> bool {
        self.coordinator.update_available()
    }

    /// Send the activation message, then reload unconditionally. The reload
    /// happens even when the message could not be delivered.
    pub fn apply(&self) -> Result<bool> {
        let sent = self.coordinator.update_service_worker();
        info!("Reloading to apply update");
        self.reloader.reload();
        sent
    }
}
