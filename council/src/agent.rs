use crate::coordination::Coordination;
use crate::presentation::Presentation;
use crate::roster::{AgentState, Seat};
use crate::text::{sanitize_for_speech, strip_reasoning, worth_speaking};
use crate::traits::{Generator, HistoryStore, Presenter, Speaker, Synthesizer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Backends an agent talks to during its turn.
#[derive(Clone)]
pub struct Backends {
    pub generator: Arc<dyn Generator>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub speaker: Arc<dyn Speaker>,
    pub presenter: Arc<dyn Presenter>,
    pub history: Arc<dyn HistoryStore>,
}

/// How a single turn ended.
#[derive(Debug, PartialEq, Eq)]
enum Turn {
    /// Spoke and presented.
    Spoken,
    /// Reply too short to voice.
    Silent,
    /// Shutdown was observed mid-turn.
    Aborted,
}

/// The loop driving one agent seat.
///
/// Each turn: claim the gate, generate under the turn lock, fan the reply out,
/// hand the floor to a random peer (unless paused), then synthesize and speak
/// under the speak lock. A failing backend ends the loop for good.
pub struct AgentActor {
    index: usize,
    ctx: Arc<Coordination>,
    backends: Backends,
}

impl AgentActor {
    /// Fails if `index` is not a seat of the roster in `ctx`.
    pub fn new(index: usize, ctx: Arc<Coordination>, backends: Backends) -> Result<Self> {
        anyhow::ensure!(
            index < ctx.roster().len(),
            "no agent at index {index} (roster has {})",
            ctx.roster().len()
        );
        Ok(Self {
            index,
            ctx,
            backends,
        })
    }

    /// Run the loop on its own task. Errors are logged before being returned.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(async move {
            let name = self.seat().name().to_string();
            let res = self.run().await;
            if let Err(e) = &res {
                error!(agent = %name, "agent stopped: {e:#}");
            }
            res
        })
    }

    fn seat(&self) -> &Seat {
        self.ctx.roster().at(self.index)
    }

    fn enter(&self, state: AgentState) {
        debug!(agent = %self.seat().name(), ?state, "agent state");
        self.seat().set_state(state);
    }

    pub async fn run(self) -> Result<()> {
        let name = self.seat().name().to_string();
        info!(agent = %name, "agent started");
        let shutdown = self.ctx.shutdown().token();
        let poll = self.ctx.timing().idle_poll;
        loop {
            self.enter(AgentState::Idle);
            if !self.seat().gate().wait(&shutdown, poll).await {
                break;
            }
            self.enter(AgentState::Claimed);
            info!(agent = %name, "started speaking");
            match self.take_turn().await {
                Ok(Turn::Aborted) => break,
                Ok(turn) => debug!(agent = %name, ?turn, "turn complete"),
                Err(e) => {
                    self.enter(AgentState::Failed);
                    return Err(e);
                }
            }
            info!(agent = %name, "finished speaking");
        }
        self.enter(AgentState::ShutdownExiting);
        info!(agent = %name, "agent exiting due to shutdown");
        Ok(())
    }

    async fn take_turn(&self) -> Result<Turn> {
        let seat = self.seat();
        let profile = seat.profile();
        let shutdown = self.ctx.shutdown();

        let spoken = {
            let mut ledger = tokio::select! {
                ledger = self.ctx.turn_lock() => ledger,
                _ = shutdown.triggered() => return Ok(Turn::Aborted),
            };
            // the lock may have been handed over just as shutdown fired
            if shutdown.is_triggered() {
                return Ok(Turn::Aborted);
            }
            self.enter(AgentState::Generating);
            let prompt = ledger
                .transcript(self.index)
                .map(|t| t.prompt())
                .unwrap_or_default();
            let response = self
                .backends
                .generator
                .generate(&prompt)
                .await
                .with_context(|| format!("{} failed to generate a reply", profile.name))?;
            if shutdown.is_triggered() {
                info!(agent = %profile.name, "aborting after generation due to shutdown");
                return Ok(Turn::Aborted);
            }
            self.enter(AgentState::FanningOut);
            let spoken = strip_reasoning(&response);
            info!(agent = %profile.name, %spoken, "got response");
            ledger.fan_out(self.index, &spoken);
            ledger.persist(self.backends.history.as_ref()).await;
            spoken
        };

        if !self.ctx.is_paused() {
            self.enter(AgentState::SchedulingNext);
            self.schedule_next();
        }

        let speech = sanitize_for_speech(&spoken);
        if !worth_speaking(&speech) {
            info!(agent = %profile.name, "skipping speech for very short reply");
            return Ok(Turn::Silent);
        }
        if shutdown.is_triggered() {
            return Ok(Turn::Aborted);
        }

        self.enter(AgentState::Synthesizing);
        let clip = self
            .backends
            .synthesizer
            .synthesize(&speech, &profile.speaker_id)
            .await
            .with_context(|| format!("speech synthesis failed for {}", profile.name))?;

        self.enter(AgentState::AwaitingVoice);
        let _voice = tokio::select! {
            guard = self.ctx.speak_lock() => guard,
            _ = shutdown.triggered() => return Ok(Turn::Aborted),
        };
        if shutdown.is_triggered() {
            return Ok(Turn::Aborted);
        }

        self.enter(AgentState::Speaking);
        info!(agent = %profile.name, "playing audio");
        self.backends
            .speaker
            .play(&clip)
            .await
            .with_context(|| format!("audio playback failed for {}", profile.name))?;
        if shutdown.is_triggered() {
            return Ok(Turn::Aborted);
        }

        self.enter(AgentState::Presenting);
        self.present(&spoken).await;
        Ok(Turn::Spoken)
    }

    /// Hand the floor to a random peer. Not guarded by either lock.
    fn schedule_next(&self) {
        let roster = self.ctx.roster();
        match roster.pick_peer(self.index).and_then(|i| roster.seat(i)) {
            Some(peer) => {
                info!(agent = %self.seat().name(), next = %peer.name(), "activating next agent");
                peer.gate().activate();
            }
            None => warn!(agent = %self.seat().name(), "no one else to activate"),
        }
    }

    async fn present(&self, text: &str) {
        let profile = self.seat().profile();
        let presenter = &self.backends.presenter;
        let hold = self.ctx.timing().present_hold;
        presenter.present(Presentation::StartAgent {
            agent_id: profile.id,
            filter: profile.filter.clone(),
        });
        presenter.present(Presentation::AgentMessage {
            agent_id: profile.id,
            text: text.to_string(),
        });
        tokio::time::sleep(hold).await;
        presenter.present(Presentation::ClearAgent {
            agent_id: profile.id,
        });
        tokio::time::sleep(hold).await;
    }
}
