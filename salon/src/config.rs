use anyhow::Context;
use clap::Parser;
use council::{AgentProfile, InputMode};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Command line options. Every flag can also come from the environment or a
/// `.env` file.
#[derive(Debug, Parser)]
#[command(author, version, about = "A table of voiced language-model characters and one human")]
pub struct Cli {
    /// Address to bind the HTTP server
    #[arg(long, env = "SALON_ADDR", default_value = "127.0.0.1:5151")]
    pub addr: String,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model every agent generates with
    #[arg(long, env = "OLLAMA_MODEL", default_value = "gemma3n:e4b")]
    pub ollama_model: String,

    /// Coqui TTS endpoint
    #[arg(long, env = "COQUI_URL", default_value = "http://localhost:5002/api/tts")]
    pub coqui_url: String,

    /// Base URL of an OpenAI-compatible transcription API
    #[arg(long, env = "STT_URL", default_value = "http://localhost:8000/v1")]
    pub stt_url: String,

    /// Bearer token for the transcription API
    #[arg(long, env = "STT_API_KEY", default_value = "", hide_env_values = true)]
    pub stt_key: String,

    #[arg(long, env = "STT_MODEL", default_value = "whisper-1")]
    pub stt_model: String,

    /// JSON file with the agent list
    #[arg(long, env = "SALON_ROSTER")]
    pub roster: Option<PathBuf>,

    /// How many roster entries take part
    #[arg(long, env = "SALON_AGENTS", default_value_t = 3)]
    pub agents: usize,

    /// Prefix of the human's label in every transcript
    #[arg(long, env = "HUMAN_NAME", default_value = "HUMAN")]
    pub human_name: String,

    /// Initial human input mode (text or voice)
    #[arg(long, env = "SALON_MODE", default_value = "text")]
    pub mode: InputMode,

    /// Directory for transcript backups
    #[arg(long, env = "SALON_BACKUP_DIR", default_value = "backup_history")]
    pub backup_dir: PathBuf,

    /// Continue the conversation stored in the backups
    #[arg(long)]
    pub restore: bool,

    /// Launch `ollama serve` before starting
    #[arg(long)]
    pub spawn_ollama: bool,
}

impl Cli {
    /// The agents taking part, from `--roster` or the built-in cast.
    pub fn profiles(&self) -> anyhow::Result<Vec<AgentProfile>> {
        let all = match &self.roster {
            Some(path) => load_roster(path)?,
            None => default_roster(),
        };
        select(all, self.agents)
    }
}

/// Read a JSON array of agent profiles.
pub fn load_roster(path: &Path) -> anyhow::Result<Vec<AgentProfile>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading roster {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing roster {}", path.display()))
}

fn select(mut all: Vec<AgentProfile>, count: usize) -> anyhow::Result<Vec<AgentProfile>> {
    anyhow::ensure!(count > 0, "at least one agent is required");
    anyhow::ensure!(
        count <= all.len(),
        "{count} agents requested but the roster only has {}",
        all.len()
    );
    all.truncate(count);
    let mut names = HashSet::new();
    for profile in &all {
        anyhow::ensure!(!profile.name.trim().is_empty(), "agent {} has no name", profile.id);
        anyhow::ensure!(
            names.insert(profile.name.as_str()),
            "agent name {} is used twice",
            profile.name
        );
    }
    Ok(all)
}

const TABLE_RULES: &str = "You are one of several people in a lively spoken conversation. \
Answer in two or three sentences, never more than 120 words, and always stay in character. \
Lines from others start with their name in brackets, like [VICTORIA]; do not start your own \
reply that way. Build on what was said instead of repeating it.";

/// The built-in cast of three.
pub fn default_roster() -> Vec<AgentProfile> {
    let cast = [
        (
            "OSWALD",
            1,
            "Audio Move - Wario Pepper",
            "p241",
            "You are Oswald, an endlessly curious retired lighthouse keeper who turns every topic into a question.",
        ),
        (
            "TONY KING OF NEW YORK",
            2,
            "Audio Move - Waluigi Pepper",
            "p267",
            "You are Tony, a brash New York pizzeria owner convinced his city does everything best.",
        ),
        (
            "VICTORIA",
            3,
            "Audio Move - Gamer Pepper",
            "p243",
            "You are Victoria, a dry-witted competitive gamer who keeps score of every argument.",
        ),
    ];
    cast.into_iter()
        .map(|(name, id, filter, speaker_id, persona)| AgentProfile {
            name: name.into(),
            id,
            filter: filter.into(),
            speaker_id: speaker_id.into(),
            system_prompt: format!("{persona} {TABLE_RULES}"),
        })
        .collect()
}
