//! Speech synthesis through a Coqui TTS server.

use async_trait::async_trait;
use council::{AudioClip, Synthesizer};
use reqwest::{Client, Url};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum TTSError {
    #[error("invalid tts url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("tts server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("tts server returned no audio")]
    EmptyAudio,
    #[error(transparent)]
    Wav(#[from] hound::Error),
}

/// Convenience result type used throughout this crate.
pub type Result<T> = std::result::Result<T, TTSError>;

/// Client for a Coqui TTS server.
#[derive(Clone)]
pub struct CoquiTts {
    url: String,
    client: Client,
    /// Optional language code passed as the `language_id` query parameter
    language_id: Option<String>,
}

impl CoquiTts {
    /// Create a new client targeting `url` (e.g. `http://localhost:5002/api/tts`).
    pub fn new(url: impl Into<String>, language_id: Option<String>) -> Self {
        Self {
            url: url.into(),
            client: Client::new(),
            language_id,
        }
    }

    /// The request URL for `text` spoken by `speaker_id`.
    pub fn request_url(&self, text: &str, speaker_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| TTSError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("text", text)
            .append_pair("speaker_id", speaker_id)
            .append_pair("style_wav", "")
            .append_pair("language_id", self.language_id.as_deref().unwrap_or(""));
        Ok(url)
    }

    /// Fetch the WAV rendering of `text`.
    pub async fn fetch_wav(&self, text: &str, speaker_id: &str) -> Result<Vec<u8>> {
        let url = self.request_url(text, speaker_id)?;
        info!(%speaker_id, chars = text.len(), "requesting TTS");
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(TTSError::Status(resp.status()));
        }
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(TTSError::EmptyAudio);
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for CoquiTts {
    async fn synthesize(&self, text: &str, speaker_id: &str) -> anyhow::Result<AudioClip> {
        Ok(AudioClip::new(self.fetch_wav(text, speaker_id).await?))
    }
}

/// Playback length of a WAV buffer.
pub fn wav_duration(wav: &[u8]) -> Result<Duration> {
    let reader = hound::WavReader::new(Cursor::new(wav))?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return Ok(Duration::ZERO);
    }
    // duration() counts frames, i.e. samples per channel
    Ok(Duration::from_secs_f64(reader.duration() as f64 / rate as f64))
}
