//! Audio and keyboard devices backed by the browser page.
//!
//! The page plays the clips it is sent, streams microphone PCM while a
//! recording is active and reports hotkey presses over the websocket.

use crate::EventBus;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use council::{AudioClip, Hotkey, Keyboard, Presentation, Recorder, Speaker};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Sends an agent's clips to the page and waits out their playback time.
pub struct BrowserSpeaker {
    bus: EventBus,
    agent_id: u32,
}

impl BrowserSpeaker {
    pub fn new(bus: EventBus, agent_id: u32) -> Self {
        Self { bus, agent_id }
    }
}

#[async_trait]
impl Speaker for BrowserSpeaker {
    async fn play(&self, clip: &AudioClip) -> anyhow::Result<()> {
        let length = tts::wav_duration(clip.as_bytes()).context("unplayable audio")?;
        if self.bus.listeners() == 0 {
            debug!(agent_id = self.agent_id, "no page connected; playing to nobody");
        }
        self.bus.publish(Presentation::Speech {
            agent_id: self.agent_id,
            audio: general_purpose::STANDARD.encode(clip.as_bytes()),
        });
        tokio::time::sleep(length).await;
        Ok(())
    }
}

/// Collects 16 kHz mono PCM pushed by the page between `begin` and `finish`.
#[derive(Default)]
pub struct BrowserMic {
    recording: AtomicBool,
    samples: Mutex<Vec<i16>>,
}

impl BrowserMic {
    /// Append little-endian i16 PCM. Ignored unless recording.
    pub fn push_pcm(&self, bytes: &[u8]) {
        if !self.recording.load(Ordering::SeqCst) {
            return;
        }
        if let Ok(mut samples) = self.samples.lock() {
            samples.extend(voice::samples_from_le_bytes(bytes));
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recorder for BrowserMic {
    async fn begin(&self) -> anyhow::Result<()> {
        self.samples
            .lock()
            .map_err(|_| anyhow!("microphone buffer poisoned"))?
            .clear();
        self.recording.store(true, Ordering::SeqCst);
        info!("microphone open");
        Ok(())
    }

    async fn finish(&self) -> anyhow::Result<AudioClip> {
        self.recording.store(false, Ordering::SeqCst);
        let samples = std::mem::take(
            &mut *self
                .samples
                .lock()
                .map_err(|_| anyhow!("microphone buffer poisoned"))?,
        );
        info!(samples = samples.len(), "microphone closed");
        if samples.is_empty() {
            return Ok(AudioClip::default());
        }
        Ok(AudioClip::new(voice::pcm_to_wav(&samples, voice::SAMPLE_RATE)?))
    }
}

/// Hotkeys currently held down on the page.
#[derive(Default)]
pub struct BrowserKeyboard {
    pressed: Mutex<HashSet<Hotkey>>,
}

impl BrowserKeyboard {
    pub fn set(&self, key: Hotkey, down: bool) {
        if let Ok(mut pressed) = self.pressed.lock() {
            if down {
                pressed.insert(key);
            } else {
                pressed.remove(&key);
            }
        }
    }

    /// Forget every held key, e.g. when the page disconnects.
    pub fn release_all(&self) {
        if let Ok(mut pressed) = self.pressed.lock() {
            pressed.clear();
        }
    }
}

impl Keyboard for BrowserKeyboard {
    fn is_pressed(&self, key: Hotkey) -> bool {
        self.pressed
            .lock()
            .map(|p| p.contains(&key))
            .unwrap_or(false)
    }
}
