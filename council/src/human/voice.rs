use super::{Hotkey, HumanSeat};
use crate::presentation::Presentation;
use anyhow::Context;
use tracing::{debug, info, warn};

/// Push-to-talk human input driven by hotkeys.
pub struct VoiceSource {
    seat: HumanSeat,
}

enum Capture {
    Delivered,
    Abandoned,
}

impl VoiceSource {
    pub(crate) fn new(seat: HumanSeat) -> Self {
        Self { seat }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(label = %self.seat.label, "voice input started");
        let timing = *self.seat.ctx.timing();
        while self.seat.live() {
            let keyboard = self.seat.io.keyboard.clone();
            let wait = if keyboard.is_pressed(Hotkey::StartRecord) {
                if let Capture::Abandoned = self.capture().await? {
                    break;
                }
                timing.key_debounce
            } else if keyboard.is_pressed(Hotkey::PauseAll) {
                info!("agents have been paused");
                self.seat.set_paused(true);
                timing.key_debounce
            } else if let Some(index) = self.pressed_agent() {
                info!("activating agent {}", index + 1);
                self.seat.set_paused(false);
                self.seat.ctx.roster().activate(index);
                timing.key_debounce
            } else {
                timing.input_poll
            };
            if !self.seat.pause(wait).await {
                break;
            }
        }
        info!(label = %self.seat.label, "voice input stopped");
        Ok(())
    }

    fn pressed_agent(&self) -> Option<usize> {
        let keyboard = &self.seat.io.keyboard;
        (0..self.seat.ctx.roster().len()).find(|i| keyboard.is_pressed(Hotkey::Agent(*i)))
    }

    /// Record until the stop key is released, then transcribe and deliver.
    async fn capture(&mut self) -> anyhow::Result<Capture> {
        info!("agents have been paused");
        self.seat.set_paused(true);
        let io = self.seat.io.clone();
        io.recorder.begin().await.context("failed to start recording")?;
        io.presenter.present(Presentation::Recording { active: true });
        info!(label = %self.seat.label, "recording; release the stop key to finish");

        let poll = self.seat.ctx.timing().input_poll;
        let mut stop_seen = false;
        loop {
            if io.keyboard.is_pressed(Hotkey::StopRecord) {
                stop_seen = true;
            } else if stop_seen {
                break;
            }
            if !self.seat.pause(poll).await {
                let _ = io.recorder.finish().await;
                io.presenter.present(Presentation::Recording { active: false });
                if !self.seat.ctx.shutdown().is_triggered() {
                    // mode switched away mid-recording; let the agents carry on
                    self.seat.set_paused(false);
                }
                debug!("recording abandoned");
                return Ok(Capture::Abandoned);
            }
        }
        let clip = io.recorder.finish().await.context("failed to stop recording")?;
        io.presenter.present(Presentation::Recording { active: false });

        let ctx = self.seat.ctx.clone();
        {
            let Some(mut ledger) = self.seat.lock_turn(&ctx).await else {
                if !ctx.shutdown().is_triggered() {
                    self.seat.set_paused(false);
                }
                debug!("recording dropped; input stopped before transcription");
                return Ok(Capture::Abandoned);
            };
            let heard = io
                .transcriber
                .transcribe(&clip)
                .await
                .context("transcription failed")?;
            if !self.seat.live() {
                // retired while transcribing; the new source owns the table now
                if !ctx.shutdown().is_triggered() {
                    self.seat.set_paused(false);
                }
                debug!("transcript dropped; input stopped");
                return Ok(Capture::Abandoned);
            }
            let heard = heard.trim();
            if heard.is_empty() {
                warn!("transcript came back empty; nothing to add");
            } else {
                info!(label = %self.seat.label, %heard, "heard human");
                self.seat.record(&mut ledger, heard).await;
            }
        }
        self.seat.hand_over();
        Ok(Capture::Delivered)
    }
}
