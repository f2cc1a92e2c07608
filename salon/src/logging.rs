use std::io::{self, Write};
use tokio::sync::broadcast;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging to stdout and broadcast log lines over the provided channel.
///
/// `RUST_LOG` overrides the default `info` filter. Fails if a global
/// subscriber is already installed.
pub fn init_logging(tx: broadcast::Sender<String>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(move || TeeWriter {
            stdout: io::stdout(),
            tx: tx.clone(),
        })
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Writer that copies output to stdout and sends each non-empty line to the
/// `/log` subscribers as its own message.
struct TeeWriter {
    stdout: io::Stdout,
    tx: broadcast::Sender<String>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.stdout.write(buf)?;
        // nobody listening is fine
        if self.tx.receiver_count() > 0 {
            for line in String::from_utf8_lossy(&buf[..n]).lines() {
                let line = line.trim_end();
                if !line.is_empty() {
                    let _ = self.tx.send(line.to_string());
                }
            }
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}
