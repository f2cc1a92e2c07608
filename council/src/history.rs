use crate::traits::HistoryStore;
use crate::transcript::Transcript;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keeps one JSON backup per participant in a directory,
/// named `backup_history_{name}.txt`.
#[derive(Clone, Debug)]
pub struct FileHistory {
    dir: PathBuf,
}

impl FileHistory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("backup_history_{name}.txt"))
    }
}

#[async_trait]
impl HistoryStore for FileHistory {
    async fn save(&self, name: &str, transcript: &Transcript) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(name);
        let json = serde_json::to_string_pretty(transcript)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        debug!(%name, path = %path.display(), "saved transcript");
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Transcript>> {
        let path = self.path_for(name);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let transcript = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(transcript))
    }
}
