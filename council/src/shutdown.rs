use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How the shutdown was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownPath {
    /// OS interrupt (Ctrl+C / Ctrl+Break). The process is expected to exit
    /// right after the cleanup hooks ran.
    Interrupt,
    /// The human asked to leave. Loops wind down and the process exits normally.
    ExitCommand,
}

type Cleanup = Box<dyn FnOnce() + Send>;

/// One-shot, process-wide shutdown signal.
///
/// Loops poll [`Shutdown::is_triggered`] at every phase boundary or await
/// [`Shutdown::triggered`] while idle. Once set it is never unset.
#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
    cleanups: Arc<Mutex<Vec<Cleanup>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a best-effort hook run once when shutdown is triggered.
    ///
    /// Hooks must not block for long and should swallow their own errors.
    pub fn on_shutdown(&self, hook: impl FnOnce() + Send + 'static) {
        match self.cleanups.lock() {
            Ok(mut hooks) => hooks.push(Box::new(hook)),
            Err(_) => warn!("shutdown hooks poisoned; hook dropped"),
        }
    }

    /// Fire the signal and run the cleanup hooks.
    ///
    /// Returns `true` only for the call that actually fired it.
    pub fn trigger(&self, path: ShutdownPath) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        info!(?path, "shutdown requested");
        self.token.cancel();
        let hooks: Vec<Cleanup> = match self.cleanups.lock() {
            Ok(mut hooks) => hooks.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for hook in hooks {
            hook();
        }
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Token cancelled on shutdown, for child tokens and graceful servers.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}
