#![allow(dead_code)]

use async_trait::async_trait;
use council::{
    AgentActor, AgentProfile, AudioClip, Backends, Coordination, Generator, HistoryStore, Hotkey,
    HumanIo, InputMode, Keyboard, Presentation, Presenter, Recorder, Roster, Speaker, Synthesizer,
    Timing, Transcriber, Transcript,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub fn profile(name: &str, id: u32) -> AgentProfile {
    AgentProfile {
        name: name.into(),
        id,
        filter: format!("{}_filter", name.to_lowercase()),
        speaker_id: format!("p{id}"),
        system_prompt: "Keep it short.".into(),
    }
}

pub fn timing() -> Timing {
    Timing::with_unit(Duration::from_millis(20))
}

/// Poll `cond` until it holds, failing the test after a few seconds.
pub async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
    eventually_async(what, || std::future::ready(cond())).await
}

pub async fn eventually_async<F, Fut>(what: &str, mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond().await {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Replies from a script, then a fixed line forever.
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<String>>,
    fallback: String,
    pub prompts: Mutex<Vec<String>>,
    pub delay: Duration,
}

impl ScriptedGenerator {
    pub fn new(fallback: &str) -> Self {
        Self {
            fallback: fallback.into(),
            ..Default::default()
        }
    }

    pub fn with_script(fallback: &str, script: &[&str]) -> Self {
        Self {
            script: Mutex::new(script.iter().map(|s| s.to_string()).collect()),
            ..Self::new(fallback)
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

#[derive(Default)]
pub struct FailingGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("model went away")
    }
}

#[derive(Default)]
pub struct CountingSynth {
    pub texts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Synthesizer for CountingSynth {
    async fn synthesize(&self, text: &str, speaker_id: &str) -> anyhow::Result<AudioClip> {
        self.texts
            .lock()
            .unwrap()
            .push((text.to_string(), speaker_id.to_string()));
        Ok(AudioClip::new(text.as_bytes().to_vec()))
    }
}

impl CountingSynth {
    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }
}

/// Tracks how many clips play at once.
#[derive(Default)]
pub struct CountingSpeaker {
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub plays: AtomicUsize,
    pub hold: Duration,
}

impl CountingSpeaker {
    pub fn with_hold(hold: Duration) -> Self {
        Self {
            hold,
            ..Default::default()
        }
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Speaker for CountingSpeaker {
    async fn play(&self, _clip: &AudioClip) -> anyhow::Result<()> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.plays.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub events: Mutex<Vec<Presentation>>,
}

impl RecordingPresenter {
    pub fn count(&self, pred: impl Fn(&Presentation) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl Presenter for RecordingPresenter {
    fn present(&self, event: Presentation) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub struct MemoryHistory {
    pub saved: Mutex<HashMap<String, Transcript>>,
    pub saves: AtomicUsize,
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn save(&self, name: &str, transcript: &Transcript) -> anyhow::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.saved
            .lock()
            .unwrap()
            .insert(name.to_string(), transcript.clone());
        Ok(())
    }

    async fn load(&self, name: &str) -> anyhow::Result<Option<Transcript>> {
        Ok(self.saved.lock().unwrap().get(name).cloned())
    }
}

/// Hotkeys pressed by the test, counting every poll.
#[derive(Default)]
pub struct FakeKeyboard {
    pressed: Mutex<HashSet<Hotkey>>,
    pub polls: AtomicUsize,
}

impl FakeKeyboard {
    pub fn press(&self, key: Hotkey) {
        self.pressed.lock().unwrap().insert(key);
    }

    pub fn release(&self, key: Hotkey) {
        self.pressed.lock().unwrap().remove(&key);
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

impl Keyboard for FakeKeyboard {
    fn is_pressed(&self, key: Hotkey) -> bool {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.pressed.lock().unwrap().contains(&key)
    }
}

#[derive(Default)]
pub struct FakeRecorder {
    pub begins: AtomicUsize,
    pub finishes: AtomicUsize,
}

#[async_trait]
impl Recorder for FakeRecorder {
    async fn begin(&self) -> anyhow::Result<()> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn finish(&self) -> anyhow::Result<AudioClip> {
        self.finishes.fetch_add(1, Ordering::SeqCst);
        Ok(AudioClip::new(b"RIFF".to_vec()))
    }
}

pub struct FixedTranscriber(pub String);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Takes `delay` per clip, then hears a fixed line.
pub struct SlowTranscriber {
    heard: String,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl SlowTranscriber {
    pub fn new(heard: &str, delay: Duration) -> Self {
        Self {
            heard: heard.into(),
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for SlowTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.heard.clone())
    }
}

/// A coordination context plus recording backends.
pub struct Table {
    pub ctx: Arc<Coordination>,
    pub generator: Arc<ScriptedGenerator>,
    pub synth: Arc<CountingSynth>,
    pub speaker: Arc<CountingSpeaker>,
    pub presenter: Arc<RecordingPresenter>,
    pub history: Arc<MemoryHistory>,
}

impl Table {
    pub fn new(names: &[&str], mode: InputMode) -> Self {
        Self::with_generator(names, mode, ScriptedGenerator::new("A perfectly fine reply."))
    }

    pub fn with_generator(names: &[&str], mode: InputMode, generator: ScriptedGenerator) -> Self {
        let profiles = names
            .iter()
            .enumerate()
            .map(|(i, n)| profile(n, i as u32 + 1))
            .collect();
        Self {
            ctx: Arc::new(Coordination::new(Roster::new(profiles), mode, timing())),
            generator: Arc::new(generator),
            synth: Arc::new(CountingSynth::default()),
            speaker: Arc::new(CountingSpeaker::with_hold(Duration::from_millis(5))),
            presenter: Arc::new(RecordingPresenter::default()),
            history: Arc::new(MemoryHistory::default()),
        }
    }

    pub fn backends(&self) -> Backends {
        self.backends_with(self.generator.clone())
    }

    pub fn backends_with(&self, generator: Arc<dyn Generator>) -> Backends {
        Backends {
            generator,
            synthesizer: self.synth.clone(),
            speaker: self.speaker.clone(),
            presenter: self.presenter.clone(),
            history: self.history.clone(),
        }
    }

    pub fn spawn_agent(&self, index: usize) -> JoinHandle<anyhow::Result<()>> {
        AgentActor::new(index, self.ctx.clone(), self.backends())
            .unwrap()
            .spawn()
    }

    pub fn spawn_all(&self) -> Vec<JoinHandle<anyhow::Result<()>>> {
        (0..self.ctx.roster().len())
            .map(|i| self.spawn_agent(i))
            .collect()
    }

    /// Human I/O wired to fakes, plus the sender for typed lines.
    pub fn human_io(
        &self,
        keyboard: Arc<FakeKeyboard>,
        recorder: Arc<FakeRecorder>,
        heard: &str,
    ) -> (HumanIo, mpsc::UnboundedSender<String>) {
        self.human_io_with(keyboard, recorder, Arc::new(FixedTranscriber(heard.into())))
    }

    pub fn human_io_with(
        &self,
        keyboard: Arc<FakeKeyboard>,
        recorder: Arc<FakeRecorder>,
        transcriber: Arc<dyn Transcriber>,
    ) -> (HumanIo, mpsc::UnboundedSender<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let io = HumanIo {
            lines: Arc::new(tokio::sync::Mutex::new(rx)),
            keyboard,
            recorder,
            transcriber,
            presenter: self.presenter.clone(),
            history: self.history.clone(),
        };
        (io, tx)
    }

    pub fn raised_gates(&self) -> Vec<usize> {
        self.ctx
            .roster()
            .seats()
            .enumerate()
            .filter(|(_, s)| s.gate().is_raised())
            .map(|(i, _)| i)
            .collect()
    }
}
