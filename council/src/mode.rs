use crate::coordination::Coordination;
use crate::human::{HumanInput, HumanIo};
use crate::presentation::Presentation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How the human talks to the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    Text,
    Voice,
}

impl InputMode {
    pub(crate) fn label_suffix(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Voice => "VOICE",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Voice => "voice",
        })
    }
}

impl FromStr for InputMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            other => anyhow::bail!("unknown input mode '{other}' (expected text or voice)"),
        }
    }
}

struct LiveSource {
    mode: InputMode,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Swaps the live [`HumanInput`] at runtime.
///
/// The inner lock is the mode lock: the active mode only changes while it is
/// held, and at most one source is started per switch.
pub struct ModeSwitch {
    ctx: Arc<Coordination>,
    io: HumanIo,
    human_name: String,
    live: Mutex<Option<LiveSource>>,
}

impl ModeSwitch {
    pub fn new(ctx: Arc<Coordination>, io: HumanIo, human_name: impl Into<String>) -> Self {
        Self {
            ctx,
            io,
            human_name: human_name.into(),
            live: Mutex::new(None),
        }
    }

    /// Start the source for the current mode if none is running.
    pub async fn start(&self) {
        let mut live = self.live.lock().await;
        if live.is_none() {
            *live = Some(self.spawn(self.ctx.mode()));
        }
    }

    /// Switch to `mode`. Returns `false` if it was already active.
    ///
    /// The previous loop is asked to stop and given the join timeout to do so.
    /// If it takes longer the new loop starts anyway; the old one exits on its
    /// next check because the mode no longer matches.
    pub async fn switch(&self, mode: InputMode) -> bool {
        let mut live = self.live.lock().await;
        if self.ctx.mode() == mode {
            info!(%mode, "already in {mode} mode");
            return false;
        }
        info!(%mode, "switching human mode");
        self.ctx.set_mode(mode);
        if let Some(old) = live.take() {
            self.retire(old).await;
        }
        *live = Some(self.spawn(mode));
        self.io.presenter.present(Presentation::Mode { mode });
        info!(%mode, "human input switched to {mode} mode");
        true
    }

    /// Mode of the running source, if any.
    pub async fn live_mode(&self) -> Option<InputMode> {
        self.live.lock().await.as_ref().map(|l| l.mode)
    }

    /// Stop the running source, waiting up to the join timeout.
    pub async fn stop(&self) {
        if let Some(old) = self.live.lock().await.take() {
            self.retire(old).await;
        }
    }

    async fn retire(&self, old: LiveSource) {
        old.cancel.cancel();
        let timeout = self.ctx.timing().mode_join_timeout;
        if tokio::time::timeout(timeout, old.handle).await.is_err() {
            warn!(mode = %old.mode, "previous input loop did not stop in time; continuing");
        }
    }

    fn spawn(&self, mode: InputMode) -> LiveSource {
        let cancel = self.ctx.shutdown().token().child_token();
        let source = HumanInput::new(
            mode,
            &self.human_name,
            self.ctx.clone(),
            self.io.clone(),
            cancel.clone(),
        );
        let handle = tokio::spawn(async move {
            if let Err(e) = source.run().await {
                error!(?e, %mode, "human input loop failed");
            }
        });
        LiveSource {
            mode,
            cancel,
            handle,
        }
    }
}
