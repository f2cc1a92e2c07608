//! Standard input as a control surface.
//!
//! Plain lines go to the text input source. A few slash commands reach the
//! control loop regardless of the input mode: `/text`, `/voice`, `/pause`
//! and `/N` to hand the floor to agent N.

use council::human::EXIT_KEYWORD;
use council::{Command, Coordination, InputMode, ShutdownPath};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleInput {
    Line(String),
    Command(Command),
}

/// Interpret one console line.
pub fn parse_line(line: &str) -> ConsoleInput {
    let Some(rest) = line.trim().strip_prefix('/') else {
        return ConsoleInput::Line(line.to_string());
    };
    let command = match rest.to_ascii_lowercase().as_str() {
        "text" => Command::SwitchMode(InputMode::Text),
        "voice" => Command::SwitchMode(InputMode::Voice),
        "pause" => Command::PauseAll,
        n => match n.parse::<usize>() {
            Ok(n) if n > 0 => Command::Activate(n - 1),
            _ => return ConsoleInput::Line(line.to_string()),
        },
    };
    ConsoleInput::Command(command)
}

/// Read stdin on a plain thread. Blocking reads cannot be cancelled, and a
/// read left on the runtime's blocking pool would keep the process alive
/// after shutdown until another line arrived.
fn spawn_stdin_reader() -> std::io::Result<mpsc::UnboundedReceiver<std::io::Result<String>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.send(line).is_err() {
                    return;
                }
            }
        })?;
    Ok(rx)
}

/// Forward stdin until it closes. End of input counts as the exit command.
pub async fn forward_stdin(
    ctx: Arc<Coordination>,
    lines: mpsc::UnboundedSender<String>,
    commands: mpsc::Sender<Command>,
) {
    let mut stdin = match spawn_stdin_reader() {
        Ok(rx) => rx,
        Err(e) => {
            warn!(?e, "cannot start the stdin reader; use the page instead");
            return;
        }
    };
    loop {
        let line = tokio::select! {
            line = stdin.recv() => line,
            _ = ctx.shutdown().triggered() => return,
        };
        match line {
            Some(Ok(line)) => match parse_line(&line) {
                ConsoleInput::Command(command) => {
                    if commands.send(command).await.is_err() {
                        return;
                    }
                }
                ConsoleInput::Line(line) => {
                    if ctx.mode() != InputMode::Text {
                        if line.trim().eq_ignore_ascii_case(EXIT_KEYWORD) {
                            ctx.shutdown().trigger(ShutdownPath::ExitCommand);
                            return;
                        }
                        warn!("in voice mode; type /text to switch back to typing");
                        continue;
                    }
                    if lines.send(line).is_err() {
                        return;
                    }
                }
            },
            None => {
                info!("standard input closed; leaving the conversation");
                ctx.shutdown().trigger(ShutdownPath::ExitCommand);
                return;
            }
            Some(Err(e)) => {
                warn!(?e, "cannot read standard input");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_commands() {
        assert_eq!(
            parse_line("/voice"),
            ConsoleInput::Command(Command::SwitchMode(InputMode::Voice))
        );
        assert_eq!(parse_line(" /2 "), ConsoleInput::Command(Command::Activate(1)));
        assert_eq!(parse_line("/PAUSE"), ConsoleInput::Command(Command::PauseAll));
    }

    #[test]
    fn everything_else_is_a_line() {
        assert_eq!(parse_line("/0"), ConsoleInput::Line("/0".into()));
        assert_eq!(parse_line("hello /2"), ConsoleInput::Line("hello /2".into()));
        assert_eq!(parse_line("exit"), ConsoleInput::Line("exit".into()));
    }
}
