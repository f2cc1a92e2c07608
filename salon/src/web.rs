use crate::devices::{BrowserKeyboard, BrowserMic};
use crate::EventBus;
use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::{Html, IntoResponse},
    routing::get,
};
use council::{Command, Coordination, Hotkey, InputMode, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// State shared across HTTP handlers and WebSocket tasks.
#[derive(Clone)]
pub struct AppState {
    pub bus: EventBus,
    pub ctx: Arc<Coordination>,
    /// Typed lines for the text input source.
    pub lines: mpsc::UnboundedSender<String>,
    pub commands: mpsc::Sender<Command>,
    pub keyboard: Arc<BrowserKeyboard>,
    pub mic: Arc<BrowserMic>,
}

/// Requests the page sends over `/ws`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsRequest {
    /// A typed line, as if entered on the console.
    Say { text: String },
    Mode { mode: InputMode },
    /// One-based position in the roster.
    Activate { agent: usize },
    Pause,
    Key { key: Hotkey, down: bool },
    Shutdown,
}

#[derive(Serialize)]
struct TranscriptEntry<'a> {
    name: &'a str,
    messages: &'a [Message],
}

pub async fn index() -> Html<&'static str> {
    static INDEX: &str = include_str!("../static/index.html");
    Html(INDEX)
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("websocket upgrade initiated");
    ws.on_upgrade(move |socket| async move { handle_socket(socket, state).await })
}

pub async fn log_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    info!("log websocket upgrade initiated");
    ws.on_upgrade(move |socket| async move { handle_log_socket(socket, state).await })
}

/// Every agent transcript, in roster order, as of the last append. Served
/// from the published snapshot so it answers while an agent is generating.
pub async fn transcripts(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.ctx.snapshot();
    let entries: Vec<TranscriptEntry<'_>> = snapshot
        .iter()
        .map(|(name, t)| TranscriptEntry {
            name,
            messages: t.messages(),
        })
        .collect();
    Json(serde_json::json!(entries))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("websocket connected");
    let mut events = state.bus.subscribe_events();
    loop {
        tokio::select! {
            evt = events.recv() => {
                match evt {
                    Ok(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(p) => p,
                            Err(e) => {
                                error!(?e, "failed encoding event");
                                continue;
                            }
                        };
                        if socket.send(WsMessage::Text(payload.into())).await.is_err() {
                            error!("failed sending event");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(n, "page fell behind; events skipped");
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<WsRequest>(&text) {
                            Ok(req) => dispatch(&state, req).await,
                            Err(e) => warn!(?e, "ignoring malformed request"),
                        }
                    }
                    Some(Ok(WsMessage::Binary(pcm))) => state.mic.push_pcm(&pcm),
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(?e, "websocket error");
                        break;
                    }
                    _ => {}
                }
            }
            _ = state.ctx.shutdown().triggered() => break,
        }
    }
    // a page that vanished cannot release its keys
    state.keyboard.release_all();
    info!("websocket disconnected");
}

/// Act on one page request.
pub async fn dispatch(state: &AppState, req: WsRequest) {
    debug!(?req, "page request");
    let command = match req {
        WsRequest::Say { text } => {
            if state.ctx.mode() != InputMode::Text {
                warn!("not in text mode; switch modes to type");
                return;
            }
            let _ = state.lines.send(text);
            return;
        }
        WsRequest::Key { key, down } => {
            state.keyboard.set(key, down);
            return;
        }
        WsRequest::Mode { mode } => Command::SwitchMode(mode),
        WsRequest::Activate { agent } => match agent.checked_sub(1) {
            Some(index) => Command::Activate(index),
            None => {
                warn!("agents are numbered from 1");
                return;
            }
        },
        WsRequest::Pause => Command::PauseAll,
        WsRequest::Shutdown => Command::Shutdown,
    };
    if state.commands.send(command).await.is_err() {
        warn!(?command, "control loop is gone");
    }
}

async fn handle_log_socket(mut socket: WebSocket, state: AppState) {
    info!("log websocket connected");
    let mut logs = state.bus.subscribe_logs();
    loop {
        tokio::select! {
            line = logs.recv() => match line {
                Ok(line) => {
                    if socket.send(WsMessage::Text(line.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = state.ctx.shutdown().triggered() => break,
        }
    }
    info!("log websocket disconnected");
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/log", get(log_ws_handler))
        .route("/transcripts", get(transcripts))
        .with_state(state)
}

/// Serve until shutdown is triggered.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let ctx = state.ctx.clone();
    axum::serve(listener, app(state).into_make_service())
        .with_graceful_shutdown(async move { ctx.shutdown().triggered().await })
        .await?;
    Ok(())
}
