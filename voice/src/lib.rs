//! Speech-to-text for the human's push-to-talk turns.
//!
//! Recorded microphone audio arrives as raw 16-bit PCM, is wrapped into a WAV
//! with [`pcm_to_wav`] and posted to an OpenAI-compatible
//! `/audio/transcriptions` endpoint by [`WhisperClient`].

use async_trait::async_trait;
use council::{AudioClip, Transcriber};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Sample rate the browser microphone is resampled to.
pub const SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Error)]
pub enum SttError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("STT API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error(transparent)]
    Wav(#[from] hound::Error),
}

pub type Result<T> = std::result::Result<T, SttError>;

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Client for a Whisper-style transcription server.
#[derive(Clone)]
pub struct WhisperClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl WhisperClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }

    /// Transcribe a WAV buffer. Empty audio yields an empty transcript
    /// without a request.
    pub async fn transcribe_wav(&self, wav: Vec<u8>) -> Result<String> {
        if wav.is_empty() {
            return Ok(String::new());
        }
        let part = Part::bytes(wav).file_name("audio.wav").mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        let mut req = self.client.post(self.endpoint()).multipart(form);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        debug!(url = %self.endpoint(), "requesting transcription");
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SttError::Api { status, body });
        }
        let text = res.json::<TranscriptionResponse>().await?.text.trim().to_string();
        info!(%text, "transcribed");
        Ok(text)
    }
}

#[async_trait]
impl Transcriber for WhisperClient {
    async fn transcribe(&self, clip: &AudioClip) -> anyhow::Result<String> {
        Ok(self.transcribe_wav(clip.as_bytes().to_vec()).await?)
    }
}

/// Encode mono 16-bit samples as a WAV file.
pub fn pcm_to_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

/// Decode little-endian 16-bit PCM bytes. A trailing odd byte is dropped.
pub fn samples_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
