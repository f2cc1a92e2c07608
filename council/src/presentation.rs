use crate::mode::InputMode;
use serde::Serialize;

/// UI updates pushed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Presentation {
    /// An agent started speaking. `filter` names the visual effect to enable.
    StartAgent { agent_id: u32, filter: String },
    /// The words an agent is speaking.
    AgentMessage { agent_id: u32, text: String },
    /// The agent finished; clear its visuals.
    ClearAgent { agent_id: u32 },
    /// Base64 WAV for the browser to play.
    Speech { agent_id: u32, audio: String },
    Paused { paused: bool },
    Mode { mode: InputMode },
    Recording { active: bool },
    /// The human said something.
    Heard { speaker: String, text: String },
}
