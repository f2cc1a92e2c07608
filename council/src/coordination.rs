use crate::mode::InputMode;
use crate::roster::Roster;
use crate::shutdown::Shutdown;
use crate::timing::Timing;
use crate::traits::HistoryStore;
use crate::transcript::{Message, Transcript};
use crossbeam_utils::atomic::AtomicCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{info, warn};

/// Every agent's transcript. Only reachable through the turn lock, so all
/// appends are globally ordered.
#[derive(Debug)]
pub struct Ledger {
    names: Vec<String>,
    transcripts: Vec<Transcript>,
    published: watch::Sender<Snapshot>,
}

/// Every agent transcript by name, as of the last change.
pub type Snapshot = Arc<Vec<(String, Transcript)>>;

impl Ledger {
    fn new(roster: &Roster) -> (Self, watch::Receiver<Snapshot>) {
        let (published, snapshot) = watch::channel(Snapshot::default());
        let ledger = Self {
            names: roster.seats().map(|s| s.name().to_string()).collect(),
            transcripts: roster
                .seats()
                .map(|s| Transcript::new(s.profile().system_message()))
                .collect(),
            published,
        };
        ledger.publish();
        (ledger, snapshot)
    }

    /// Refresh the copy readers see without taking the turn lock.
    fn publish(&self) {
        let copy = self
            .transcripts()
            .map(|(name, t)| (name.to_string(), t.clone()))
            .collect();
        self.published.send_replace(Arc::new(copy));
    }

    pub fn transcript(&self, index: usize) -> Option<&Transcript> {
        self.transcripts.get(index)
    }

    pub fn transcripts(&self) -> impl Iterator<Item = (&str, &Transcript)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.transcripts.iter())
    }

    /// Record agent `from`'s reply: as a labelled user line for everyone else
    /// and as its own assistant line.
    pub(crate) fn fan_out(&mut self, from: usize, content: &str) {
        let speaker = self.names[from].clone();
        for (i, transcript) in self.transcripts.iter_mut().enumerate() {
            if i == from {
                transcript.push(Message::assistant(&speaker, content));
            } else {
                transcript.push(Message::user(&speaker, content));
            }
        }
        self.publish();
    }

    /// Record a line from the human in every agent's transcript.
    pub(crate) fn broadcast(&mut self, speaker: &str, content: &str) {
        for transcript in &mut self.transcripts {
            transcript.push(Message::user(speaker, content));
        }
        self.publish();
    }

    /// Write every transcript to `history`. Failures are logged, not returned.
    pub(crate) async fn persist(&self, history: &dyn HistoryStore) {
        for (name, transcript) in self.transcripts() {
            if let Err(e) = history.save(name, transcript).await {
                warn!(?e, %name, "failed to back up transcript");
            }
        }
    }
}

/// State shared by every agent and input loop.
///
/// The turn lock guards the [`Ledger`]; the speak lock guards audible output.
/// An agent releases the turn lock before asking for the speak lock, so the
/// two are never held in the opposite order.
pub struct Coordination {
    roster: Roster,
    turn: Mutex<Ledger>,
    snapshot: watch::Receiver<Snapshot>,
    speak: Mutex<()>,
    paused: AtomicBool,
    mode: AtomicCell<InputMode>,
    shutdown: Shutdown,
    timing: Timing,
}

impl Coordination {
    pub fn new(roster: Roster, mode: InputMode, timing: Timing) -> Self {
        let (ledger, snapshot) = Ledger::new(&roster);
        Self {
            roster,
            turn: Mutex::new(ledger),
            snapshot,
            speak: Mutex::new(()),
            paused: AtomicBool::new(false),
            mode: AtomicCell::new(mode),
            shutdown: Shutdown::new(),
            timing,
        }
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Acquire the turn lock.
    pub async fn turn_lock(&self) -> MutexGuard<'_, Ledger> {
        self.turn.lock().await
    }

    /// Acquire the speak lock.
    pub async fn speak_lock(&self) -> MutexGuard<'_, ()> {
        self.speak.lock().await
    }

    /// Whether agents are currently barred from handing the floor to a peer.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Only the human input handlers and control commands flip this.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    pub fn mode(&self) -> InputMode {
        self.mode.load()
    }

    /// Written only by [`crate::ModeSwitch`] while it holds its own lock.
    pub(crate) fn set_mode(&self, mode: InputMode) {
        self.mode.store(mode);
    }

    /// Copy of the agent transcript at `index`, taken under the turn lock.
    pub async fn transcript(&self, index: usize) -> Option<Transcript> {
        self.turn.lock().await.transcript(index).cloned()
    }

    /// Every agent transcript as of the last append. Never waits on the turn
    /// lock, so it is safe to call while an agent is generating.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Load every agent transcript from `history`. Returns how many were found.
    pub async fn restore(&self, history: &dyn HistoryStore) -> anyhow::Result<usize> {
        let mut ledger = self.turn.lock().await;
        let mut restored = 0;
        for i in 0..ledger.names.len() {
            let name = ledger.names[i].clone();
            if let Some(saved) = history.load(&name).await? {
                ledger.transcripts[i].restore_from(saved);
                restored += 1;
                info!(%name, "restored transcript");
            }
        }
        ledger.publish();
        Ok(restored)
    }
}
