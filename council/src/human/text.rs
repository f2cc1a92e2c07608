use super::HumanSeat;
use crate::shutdown::ShutdownPath;
use tracing::{info, warn};

/// Typing this (any case) ends the session.
pub const EXIT_KEYWORD: &str = "exit";

/// Human input from typed lines.
pub struct TextSource {
    seat: HumanSeat,
}

impl TextSource {
    pub(crate) fn new(seat: HumanSeat) -> Self {
        Self { seat }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        info!(label = %self.seat.label, "text input started");
        while self.seat.live() {
            info!("waiting for your input (type '{EXIT_KEYWORD}' to quit)");
            let line = {
                let lines = self.seat.io.lines.clone();
                tokio::select! {
                    line = async move { lines.lock().await.recv().await } => line,
                    _ = self.seat.cancel.cancelled() => break,
                    _ = self.seat.ctx.shutdown().triggered() => break,
                }
            };
            let Some(line) = line else {
                info!("input closed; leaving the conversation");
                self.seat.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
                break;
            };
            let text = line.trim();
            if text.eq_ignore_ascii_case(EXIT_KEYWORD) {
                info!("exit requested");
                self.seat.ctx.shutdown().trigger(ShutdownPath::ExitCommand);
                break;
            }
            if text.is_empty() {
                warn!("did not receive any input");
                continue;
            }
            if !self.deliver(text).await {
                break;
            }
            if !self.seat.pause(self.seat.ctx.timing().settle).await {
                break;
            }
        }
        info!(label = %self.seat.label, "text input stopped");
        Ok(())
    }

    /// Returns `false` if the loop was stopped before the line got in.
    async fn deliver(&mut self, text: &str) -> bool {
        let ctx = self.seat.ctx.clone();
        {
            let Some(mut ledger) = self.seat.lock_turn(&ctx).await else {
                warn!(label = %self.seat.label, "input stopped; dropping the last line");
                return false;
            };
            self.seat.record(&mut ledger, text).await;
        }
        self.seat.hand_over();
        true
    }
}
