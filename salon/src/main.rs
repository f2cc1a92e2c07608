use anyhow::Context;
use clap::Parser;
use council::{
    AgentActor, Backends, Coordination, FileHistory, HistoryStore, HumanIo, ModeSwitch, Roster,
    ShutdownPath, Timing, run_control,
};
use llm::OllamaClient;
use salon::{
    AppState, BrowserKeyboard, BrowserMic, BrowserSpeaker, Cli, EventBus, forward_stdin,
    init_logging, serve,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};
use tts::CoquiTts;
use voice::WhisperClient;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let bus = EventBus::new();
    init_logging(bus.log_sender())?;

    if cli.spawn_ollama {
        match llm::process::spawn_server() {
            Ok(_) => tokio::time::sleep(Duration::from_secs(2)).await,
            Err(e) => warn!(?e, "could not start ollama serve"),
        }
    }

    let profiles = cli.profiles()?;
    let ctx = Arc::new(Coordination::new(
        Roster::new(profiles.clone()),
        cli.mode,
        Timing::default(),
    ));
    ctx.shutdown().on_shutdown(llm::process::terminate_server);

    let history: Arc<dyn HistoryStore> = Arc::new(FileHistory::new(&cli.backup_dir));
    if cli.restore {
        let restored = ctx
            .restore(history.as_ref())
            .await
            .context("restoring transcripts")?;
        info!(restored, "continuing the previous conversation");
    }

    let generator = Arc::new(OllamaClient::new(&cli.ollama_url, &cli.ollama_model)?);
    let synthesizer = Arc::new(CoquiTts::new(&cli.coqui_url, None));
    let presenter = Arc::new(bus.clone());
    let mut agents = Vec::with_capacity(profiles.len());
    for (index, profile) in profiles.iter().enumerate() {
        let backends = Backends {
            generator: generator.clone(),
            synthesizer: synthesizer.clone(),
            speaker: Arc::new(BrowserSpeaker::new(bus.clone(), profile.id)),
            presenter: presenter.clone(),
            history: history.clone(),
        };
        agents.push(AgentActor::new(index, ctx.clone(), backends)?.spawn());
    }

    let keyboard = Arc::new(BrowserKeyboard::default());
    let mic = Arc::new(BrowserMic::default());
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let io = HumanIo {
        lines: Arc::new(Mutex::new(line_rx)),
        keyboard: keyboard.clone(),
        recorder: mic.clone(),
        transcriber: Arc::new(WhisperClient::new(&cli.stt_url, &cli.stt_key, &cli.stt_model)?),
        presenter: presenter.clone(),
        history: history.clone(),
    };
    let modes = Arc::new(ModeSwitch::new(ctx.clone(), io, &cli.human_name));
    modes.start().await;

    let (command_tx, command_rx) = mpsc::channel(16);
    let control = tokio::spawn(run_control(ctx.clone(), modes.clone(), command_rx));
    tokio::spawn(forward_stdin(ctx.clone(), line_tx.clone(), command_tx.clone()));
    tokio::spawn(interrupt(ctx.clone()));

    let addr: SocketAddr = cli.addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");
    info!(
        mode = %cli.mode,
        "agents are ready; type a message, or use /text, /voice, /pause and /N. Type 'exit' to quit"
    );
    let state = AppState {
        bus,
        ctx: ctx.clone(),
        lines: line_tx,
        commands: command_tx,
        keyboard,
        mic,
    };
    serve(listener, state).await?;

    info!("waiting for every loop to exit");
    modes.stop().await;
    let _ = control.await;
    for agent in agents {
        // failures were logged when the agent stopped
        let _ = agent.await;
    }
    info!("all loops exited");
    Ok(())
}

/// Ctrl+C (or Ctrl+Break on Windows) shuts down and exits right away.
async fn interrupt(ctx: Arc<Coordination>) {
    if let Err(e) = wait_for_interrupt().await {
        warn!(?e, "cannot listen for interrupts");
        return;
    }
    ctx.shutdown().trigger(ShutdownPath::Interrupt);
    warn!("force quitting");
    std::process::exit(0);
}

#[cfg(windows)]
async fn wait_for_interrupt() -> std::io::Result<()> {
    let mut ctrl_break = tokio::signal::windows::ctrl_break()?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = ctrl_break.recv() => Ok(()),
    }
}

#[cfg(not(windows))]
async fn wait_for_interrupt() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
