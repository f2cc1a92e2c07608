//! The human seat at the table.
//!
//! Exactly one [`HumanInput`] is live at a time. Both variants end their loop
//! on their own when their cancel token fires, the active mode changes, or
//! shutdown is requested.

mod text;
mod voice;

pub use text::{EXIT_KEYWORD, TextSource};
pub use voice::VoiceSource;

use crate::coordination::{Coordination, Ledger};
use crate::mode::InputMode;
use crate::presentation::Presentation;
use crate::traits::{HistoryStore, Keyboard, Presenter, Recorder, Transcriber};
use crate::transcript::{Message, Transcript};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Keys the voice source reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hotkey {
    /// Pause the agents and start recording.
    StartRecord,
    /// Releasing it ends the recording.
    StopRecord,
    /// Pause the agents without recording.
    PauseAll,
    /// Hand the floor to the agent at this roster index.
    Agent(usize),
}

/// Everything the human sources need besides the shared [`Coordination`].
#[derive(Clone)]
pub struct HumanIo {
    /// Typed lines. Shared so a later text source can pick up where an
    /// earlier one stopped.
    pub lines: Arc<Mutex<mpsc::UnboundedReceiver<String>>>,
    pub keyboard: Arc<dyn Keyboard>,
    pub recorder: Arc<dyn Recorder>,
    pub transcriber: Arc<dyn Transcriber>,
    pub presenter: Arc<dyn Presenter>,
    pub history: Arc<dyn HistoryStore>,
}

/// The live human input loop, one variant per [`InputMode`].
pub enum HumanInput {
    Text(TextSource),
    Voice(VoiceSource),
}

impl HumanInput {
    /// Build the source for `mode`, labelled `{human_name}_TEXT` or
    /// `{human_name}_VOICE`.
    pub fn new(
        mode: InputMode,
        human_name: &str,
        ctx: Arc<Coordination>,
        io: HumanIo,
        cancel: CancellationToken,
    ) -> Self {
        let label = format!("{human_name}_{}", mode.label_suffix());
        let seat = HumanSeat::new(label, mode, ctx, io, cancel);
        match mode {
            InputMode::Text => Self::Text(TextSource::new(seat)),
            InputMode::Voice => Self::Voice(VoiceSource::new(seat)),
        }
    }

    pub fn mode(&self) -> InputMode {
        match self {
            Self::Text(_) => InputMode::Text,
            Self::Voice(_) => InputMode::Voice,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Text(source) => source.run().await,
            Self::Voice(source) => source.run().await,
        }
    }
}

/// State common to both sources.
pub(crate) struct HumanSeat {
    label: String,
    mode: InputMode,
    ctx: Arc<Coordination>,
    io: HumanIo,
    cancel: CancellationToken,
    transcript: Transcript,
}

impl HumanSeat {
    fn new(
        label: String,
        mode: InputMode,
        ctx: Arc<Coordination>,
        io: HumanIo,
        cancel: CancellationToken,
    ) -> Self {
        let transcript = Transcript::new(format!(
            "You are the human participant in this conversation ({mode} mode)."
        ));
        Self {
            label,
            mode,
            ctx,
            io,
            cancel,
            transcript,
        }
    }

    /// Whether this loop should keep going.
    fn live(&self) -> bool {
        !self.cancel.is_cancelled()
            && !self.ctx.shutdown().is_triggered()
            && self.ctx.mode() == self.mode
    }

    /// Sleep for `dur` unless the loop is told to stop first.
    async fn pause(&self, dur: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(dur) => self.live(),
            _ = self.cancel.cancelled() => false,
            _ = self.ctx.shutdown().triggered() => false,
        }
    }

    /// Take the turn lock unless this loop is told to stop while waiting.
    /// Returns `None` if the loop should no longer deliver anything.
    async fn lock_turn<'a>(&self, ctx: &'a Coordination) -> Option<MutexGuard<'a, Ledger>> {
        let ledger = tokio::select! {
            ledger = ctx.turn_lock() => ledger,
            _ = self.cancel.cancelled() => return None,
            _ = ctx.shutdown().triggered() => return None,
        };
        // the lock may have been handed over just as we were retired
        self.live().then_some(ledger)
    }

    /// Append an utterance to every agent transcript and to our own.
    /// The caller holds the turn lock.
    async fn record(&mut self, ledger: &mut Ledger, text: &str) {
        ledger.broadcast(&self.label, text);
        self.transcript
            .push(Message::assistant(self.label.as_str(), text));
        ledger.persist(self.io.history.as_ref()).await;
        if let Err(e) = self.io.history.save(&self.label, &self.transcript).await {
            warn!(?e, label = %self.label, "failed to back up human transcript");
        }
        self.io.presenter.present(Presentation::Heard {
            speaker: self.label.clone(),
            text: text.to_string(),
        });
    }

    /// Resume the agents and give the floor to a random one.
    fn hand_over(&self) -> Option<usize> {
        info!(label = %self.label, "human finished speaking");
        self.set_paused(false);
        let roster = self.ctx.roster();
        let index = roster.pick_any()?;
        if let Some(seat) = roster.seat(index) {
            info!(agent = %seat.name(), "activating agent {}", index + 1);
            seat.gate().activate();
        }
        Some(index)
    }

    fn set_paused(&self, paused: bool) {
        self.ctx.set_paused(paused);
        self.io.presenter.present(Presentation::Paused { paused });
    }
}
