//! Local `ollama` daemon management.
//!
//! Everything here is best effort: failures are logged at debug level and
//! otherwise ignored, so these are safe to call from shutdown hooks.

use std::process::{Child, Command, Stdio};
use tracing::{debug, info};

/// Launch `ollama serve` in the background with its output discarded.
pub fn spawn_server() -> std::io::Result<Child> {
    let child = Command::new("ollama")
        .arg("serve")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    info!(pid = child.id(), "started ollama serve");
    Ok(child)
}

/// Process names to kill, as passed to the platform's kill command.
pub fn server_process_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["ollama.exe", "ollama_llama_server.exe"]
    } else {
        &["ollama", "ollama_llama_server"]
    }
}

/// The platform command that kills every process called `name`.
fn kill_command(name: &str) -> Command {
    let mut cmd = if cfg!(windows) {
        let mut cmd = Command::new("taskkill");
        cmd.args(["/F", "/IM", name]);
        cmd
    } else {
        let mut cmd = Command::new("pkill");
        cmd.arg(name);
        cmd
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}

/// Kill every running ollama process by name.
///
/// The kill commands are started and left to finish on their own, so this
/// returns without waiting on them or on the victims.
pub fn terminate_server() {
    for name in server_process_names() {
        match kill_command(name).spawn() {
            Ok(child) => debug!(%name, pid = child.id(), "sent kill"),
            Err(e) => debug!(%name, ?e, "could not run kill command"),
        }
    }
}
