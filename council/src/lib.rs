//! Turn-taking for a table of conversational agents and one human.
//!
//! Every agent runs its own loop ([`AgentActor`]) and waits on its
//! [`ActivationGate`]. Once activated it generates a reply while holding the
//! turn lock, fans the reply into every other transcript, hands the floor to a
//! random peer and then speaks while holding the speak lock. The peer's
//! generation therefore overlaps with the current speaker's playback, but only
//! one voice is ever audible.
//!
//! The human joins through a [`HumanInput`] (typed text or push-to-talk voice)
//! that is swapped at runtime by the [`ModeSwitch`]. All shared state lives in
//! one [`Coordination`] value handed to every loop.

pub mod agent;
pub mod control;
pub mod coordination;
pub mod gate;
pub mod history;
pub mod human;
pub mod mode;
pub mod presentation;
pub mod roster;
pub mod shutdown;
pub mod text;
pub mod timing;
pub mod traits;
pub mod transcript;

pub use agent::{AgentActor, Backends};
pub use control::{Command, run_control};
pub use coordination::{Coordination, Ledger, Snapshot};
pub use gate::ActivationGate;
pub use history::FileHistory;
pub use human::{Hotkey, HumanInput, HumanIo};
pub use mode::{InputMode, ModeSwitch};
pub use presentation::Presentation;
pub use roster::{AgentProfile, AgentState, Roster, Seat};
pub use shutdown::{Shutdown, ShutdownPath};
pub use text::{MIN_SPOKEN_CHARS, sanitize_for_speech, strip_reasoning};
pub use timing::Timing;
pub use traits::{
    AudioClip, Generator, HistoryStore, Keyboard, Presenter, Recorder, Speaker, Synthesizer,
    Transcriber,
};
pub use transcript::{Message, Role, Transcript};
