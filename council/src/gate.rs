use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Single-bit "you speak next" signal for one agent.
///
/// Any number of activations before the owner claims the gate collapse into
/// one turn. Only the owning agent loop lowers it.
#[derive(Debug, Default)]
pub struct ActivationGate {
    raised: AtomicBool,
    notify: Notify,
}

impl ActivationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the gate and wake the owner if it is waiting.
    pub fn activate(&self) {
        self.raised.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Take a pending activation, lowering the gate in the same step.
    pub fn claim(&self) -> bool {
        self.raised.swap(false, Ordering::SeqCst)
    }

    /// Wait until an activation is claimed.
    ///
    /// Returns `false` once `shutdown` is cancelled. The gate is re-checked at
    /// least every `poll` even without a wake-up.
    pub async fn wait(&self, shutdown: &CancellationToken, poll: Duration) -> bool {
        loop {
            if shutdown.is_cancelled() {
                return false;
            }
            if self.claim() {
                return true;
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = shutdown.cancelled() => return false,
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }
}
