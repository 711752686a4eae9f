//! Liveness-guarded state publication shared by the observers.
//!
//! Every observer publishes its state through a `watch` channel and owns a
//! scope token that plays the role of a mount flag. Mutations are applied
//! under the channel lock only while the caller's token is still live, and
//! teardown cancels the scope under that same lock, so no mutation can land
//! after `teardown` returns.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub(crate) struct LiveState<T> {
    tx: watch::Sender<T>,
    scope: CancellationToken,
}

impl<T> LiveState<T> {
    pub(crate) fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self {
            tx,
            scope: CancellationToken::new(),
        }
    }

    /// Token cancelled at teardown; per-run tokens are children of it.
    pub(crate) fn scope(&self) -> &CancellationToken {
        &self.scope
    }

    pub(crate) fn is_live(&self) -> bool {
        !self.scope.is_cancelled()
    }

    /// Apply `f` if `token` has not been cancelled. Returns whether the
    /// mutation was applied.
    pub(crate) fn update_with(&self, token: &CancellationToken, f: impl FnOnce(&mut T)) -> bool {
        self.tx.send_if_modified(|value| {
            if token.is_cancelled() {
                return false;
            }
            f(value);
            true
        })
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        self.update_with(&self.scope, f)
    }

    pub(crate) fn teardown(&self) {
        self.tx.send_if_modified(|_| {
            self.scope.cancel();
            false
        });
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone> LiveState<T> {
    pub(crate) fn snapshot(&self) -> T {
        self.tx.borrow().clone()
    }
}
