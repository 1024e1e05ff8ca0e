//! OneBot forward WebSocket client: connection loop and frame handling.
//!
//! The bot connects *to* the OneBot implementation (forward WebSocket).  One
//! connection carries both directions:
//!
//! - **Inbound**: event frames (`post_type` present) and API responses
//!   (`retcode`/`echo`, no `post_type`).  Events are handed to the
//!   [`Dispatcher`], each on its own task.  API responses are only logged.
//! - **Outbound**: action frames queued by [`WsEventBus`](super::WsEventBus).
//!   The connection loop is the only writer.  A frame whose write fails is
//!   kept and written first on the next connection.
//!
//! When the connection drops the client waits `reconnect_interval` and tries
//! again.  Shutdown is triggered by clearing the shared `running` flag; the
//! loop checks it every 200 ms.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{interval, sleep};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        handshake::client::Request,
        http::{header::AUTHORIZATION, HeaderValue},
        Message as WsMessage,
    },
};
use tracing::{debug, info, warn};

use welcome_core::BotSettings;

use crate::application::Dispatcher;

/// How often the loops look at the `running` flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Connection settings for the OneBot endpoint.
#[derive(Debug, Clone)]
pub struct OneBotSettings {
    pub ws_url: String,
    pub access_token: Option<String>,
    pub reconnect_interval: Duration,
}

impl From<&BotSettings> for OneBotSettings {
    fn from(settings: &BotSettings) -> Self {
        Self {
            ws_url: settings.ws_url.clone(),
            access_token: settings.access_token.clone(),
            reconnect_interval: settings.reconnect_interval,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the connect/reconnect loop until `running` is set to `false`.
///
/// `outbound` is the receiving end of [`WsEventBus::channel`](super::WsEventBus::channel).
///
/// # Errors
///
/// Returns an error only if the URL or access token cannot form a valid
/// handshake request.  Connection failures are logged and retried.
pub async fn run_client(
    settings: OneBotSettings,
    dispatcher: Arc<Dispatcher>,
    mut outbound: mpsc::Receiver<String>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    // A bad URL or token is not retried.
    build_request(&settings)?;

    let mut pending: Option<String> = None;
    while running.load(Ordering::Relaxed) {
        match run_session(&settings, &dispatcher, &mut outbound, &mut pending, &running).await {
            Ok(()) => info!("OneBot connection closed"),
            Err(e) => warn!("OneBot connection failed: {e:#}"),
        }

        if !running.load(Ordering::Relaxed) {
            break;
        }
        info!(
            "reconnecting in {:.1}s",
            settings.reconnect_interval.as_secs_f32()
        );
        wait_or_shutdown(settings.reconnect_interval, &running).await;
    }

    if let Some(frame) = pending {
        warn!("action {} was never delivered", frame_echo(&frame));
    }
    info!("OneBot client stopped");
    Ok(())
}

// ── Connection ────────────────────────────────────────────────────────────────

/// Builds the handshake request, adding the bearer token when configured.
fn build_request(settings: &OneBotSettings) -> anyhow::Result<Request> {
    let mut request = settings
        .ws_url
        .as_str()
        .into_client_request()
        .with_context(|| format!("invalid OneBot URL '{}'", settings.ws_url))?;

    if let Some(token) = settings.access_token.as_deref().filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("access token contains characters not allowed in a header")?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }
    Ok(request)
}

/// One connection lifetime.  Returns when the peer closes the connection,
/// an I/O error occurs, or shutdown is requested.
async fn run_session(
    settings: &OneBotSettings,
    dispatcher: &Arc<Dispatcher>,
    outbound: &mut mpsc::Receiver<String>,
    pending: &mut Option<String>,
    running: &AtomicBool,
) -> anyhow::Result<()> {
    let request = build_request(settings)?;
    let (ws_stream, _response) = connect_async(request)
        .await
        .with_context(|| format!("failed to connect to {}", settings.ws_url))?;
    info!("connected to OneBot at {}", settings.ws_url);

    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    if let Some(frame) = pending.take() {
        info!("resending action {}", frame_echo(&frame));
        write_frame(&mut ws_tx, frame, pending).await?;
    }
    let mut ticker = interval(SHUTDOWN_POLL);

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => handle_text_frame(dispatcher, &text),
                Some(Ok(WsMessage::Close(_))) | None => return Ok(()),
                Some(Ok(WsMessage::Binary(_))) => {
                    warn!("unexpected binary WebSocket frame (ignored)");
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("WebSocket read failed"),
            },

            Some(frame) = outbound.recv() => {
                write_frame(&mut ws_tx, frame, pending).await?;
            }

            _ = ticker.tick() => {
                if !running.load(Ordering::Relaxed) {
                    debug!("shutdown requested; closing connection");
                    let _ = ws_tx.send(WsMessage::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }
}

/// Writes one action frame.  On failure the frame is parked in `pending`.
async fn write_frame<S>(
    sink: &mut S,
    frame: String,
    pending: &mut Option<String>,
) -> anyhow::Result<()>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    match sink.send(WsMessage::Text(frame.clone())).await {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(
                "write of action {} failed; keeping it for the next connection",
                frame_echo(&frame)
            );
            *pending = Some(frame);
            Err(e).context("WebSocket write failed")
        }
    }
}

/// The `echo` of an action frame, for log lines.
fn frame_echo(frame: &str) -> String {
    serde_json::from_str::<Value>(frame)
        .ok()
        .and_then(|v| v.get("echo")?.as_str().map(str::to_string))
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Sleeps for `duration`, waking early when shutdown is requested.
async fn wait_or_shutdown(duration: Duration, running: &AtomicBool) {
    let mut remaining = duration;
    while !remaining.is_zero() && running.load(Ordering::Relaxed) {
        let step = remaining.min(SHUTDOWN_POLL);
        sleep(step).await;
        remaining -= step;
    }
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// What an inbound text frame turned out to be.
#[derive(Debug, PartialEq)]
enum InboundFrame {
    Event(Value),
    ApiResponse { echo: Option<String>, failed: bool },
    Invalid,
}

fn classify_frame(text: &str) -> InboundFrame {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return InboundFrame::Invalid;
    };
    if value.get("post_type").is_some() {
        return InboundFrame::Event(value);
    }
    if value.get("retcode").is_some() || value.get("echo").is_some() {
        return InboundFrame::ApiResponse {
            echo: value.get("echo").and_then(Value::as_str).map(str::to_string),
            failed: value.get("status").and_then(Value::as_str) == Some("failed"),
        };
    }
    InboundFrame::Invalid
}

fn handle_text_frame(dispatcher: &Arc<Dispatcher>, text: &str) {
    match classify_frame(text) {
        InboundFrame::Event(event) => {
            let dispatcher = Arc::clone(dispatcher);
            tokio::spawn(async move {
                dispatcher.dispatch(&event).await;
            });
        }
        InboundFrame::ApiResponse { echo, failed: true } => {
            warn!("OneBot rejected action {echo:?}");
        }
        InboundFrame::ApiResponse { .. } => {}
        InboundFrame::Invalid => debug!("ignoring unrecognised frame"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
