use crate::coordination::Coordination;
use crate::mode::{InputMode, ModeSwitch};
use crate::shutdown::ShutdownPath;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Out-of-band requests from the operator, independent of the live input mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SwitchMode(InputMode),
    /// Zero-based roster index.
    Activate(usize),
    PauseAll,
    Shutdown,
}

/// Drain `commands` until shutdown or until every sender is gone.
pub async fn run_control(
    ctx: Arc<Coordination>,
    modes: Arc<ModeSwitch>,
    mut commands: mpsc::Receiver<Command>,
) {
    loop {
        let command = tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(cmd) => cmd,
                None => break,
            },
            _ = ctx.shutdown().triggered() => break,
        };
        debug!(?command, "control command");
        match command {
            Command::SwitchMode(mode) => {
                modes.switch(mode).await;
            }
            Command::Activate(index) => {
                let Some(seat) = ctx.roster().seat(index) else {
                    warn!(index, "no agent at that position; ignoring");
                    continue;
                };
                info!(agent = %seat.name(), "activating agent {}", index + 1);
                ctx.set_paused(false);
                seat.gate().activate();
            }
            Command::PauseAll => {
                info!("agents have been paused");
                ctx.set_paused(true);
            }
            Command::Shutdown => {
                ctx.shutdown().trigger(ShutdownPath::ExitCommand);
            }
        }
    }
    debug!("control loop stopped");
}
