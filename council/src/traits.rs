//! Seams to the outside world.
//!
//! The core never talks to a model server, a sound card or a browser
//! directly; it goes through these traits so the binary can plug in real
//! backends and the tests can plug in recorders.

use crate::human::Hotkey;
use crate::presentation::Presentation;
use crate::transcript::Transcript;
use anyhow::Result;
use async_trait::async_trait;

/// Playable audio, as WAV bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AudioClip {
    wav: Vec<u8>,
}

impl AudioClip {
    pub fn new(wav: Vec<u8>) -> Self {
        Self { wav }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.wav
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.wav
    }

    pub fn len(&self) -> usize {
        self.wav.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wav.is_empty()
    }
}

/// Language model turning a prompt into a reply. May block for a long time.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Text-to-speech engine.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render `text` with the voice identified by `speaker_id`.
    async fn synthesize(&self, text: &str, speaker_id: &str) -> Result<AudioClip>;
}

/// Audio output. `play` resolves once playback has finished.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn play(&self, clip: &AudioClip) -> Result<()>;
}

/// Speech-to-text engine.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String>;
}

/// Microphone. Recording runs between `begin` and `finish`.
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn begin(&self) -> Result<()>;
    async fn finish(&self) -> Result<AudioClip>;
}

/// Hotkey state, polled by the voice input loop.
pub trait Keyboard: Send + Sync {
    fn is_pressed(&self, key: Hotkey) -> bool;
}

/// Push-only sink for UI updates. Never waits for the UI.
pub trait Presenter: Send + Sync {
    fn present(&self, event: Presentation);
}

/// Backup of transcripts, keyed by participant name.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Overwrite the stored copy of `name`'s transcript.
    async fn save(&self, name: &str, transcript: &Transcript) -> Result<()>;
    /// Read back the stored copy, if any.
    async fn load(&self, name: &str) -> Result<Option<Transcript>>;
}
