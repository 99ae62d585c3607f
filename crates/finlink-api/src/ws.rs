//! WebSocket delivery of live notifications and thread messages.
//!
//! The browser opens a socket, sends one auth frame, and receives a
//! snapshot followed by row-insert events. Outbound frames go through a
//! bounded channel so a slow client applies backpressure instead of
//! growing an unbounded queue. Dropping the feed subscription on scope
//! exit is the unsubscribe.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message as WsFrame, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use finlink_models::{ChangeEvent, ConnectionRequestId, Message, Notification};

use crate::metrics;
use crate::services::{MessageThread, NotificationStore};
use crate::session::Session;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

const WS_SEND_BUFFER_SIZE: usize = 32;
const WS_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const WS_AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// First frame the client must send after connecting.
#[derive(Deserialize)]
struct WsAuthFrame {
    token: String,
}

/// Server-to-client frames.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsServerMessage {
    /// Initial notification state after a successful auth frame.
    NotificationSnapshot {
        notifications: Vec<Notification>,
        unread: usize,
    },
    /// Initial thread state after a successful auth frame.
    ThreadSnapshot { messages: Vec<Message> },
    /// A new notification row.
    Notification {
        notification: Notification,
        unread: usize,
    },
    /// A new message row.
    Message { message: Message },
    Error { message: String },
}

impl WsServerMessage {
    fn error(message: impl Into<String>) -> Self {
        WsServerMessage::Error {
            message: message.into(),
        }
    }
}

/// Send a frame with backpressure handling.
async fn send_frame(tx: &mpsc::Sender<WsFrame>, msg: &WsServerMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(_) => return false,
    };
    match tx.try_send(WsFrame::Text(json.clone())) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!("WebSocket send buffer full, applying backpressure");
            tx.send(WsFrame::Text(json)).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Read the auth frame and resolve the session, or report why not.
async fn authenticate(
    state: &AppState,
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
) -> Result<Session, String> {
    let frame = tokio::time::timeout(WS_AUTH_TIMEOUT, receiver.next()).await;
    let text = match frame {
        Ok(Some(Ok(WsFrame::Text(text)))) => text,
        Ok(_) => return Err("Expected an auth frame".to_string()),
        Err(_) => return Err("Timed out waiting for auth frame".to_string()),
    };
    let auth: WsAuthFrame =
        serde_json::from_str(&text).map_err(|e| format!("Invalid auth frame: {e}"))?;

    let claims = state
        .verifier
        .verify_token(&auth.token)
        .map_err(|e| format!("Authentication failed: {e}"))?;
    Session::resolve(state, crate::session::AuthUser::from(claims))
        .await
        .map_err(|e| format!("Session resolution failed: {e}"))
}

/// Live notifications endpoint.
pub async fn ws_notifications(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection("notifications");

    ws.on_upgrade(|socket| async move {
        scopeguard::defer! {
            let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::set_ws_active_connections(count);
        }
        handle_notifications_socket(socket, state).await;
    })
}

async fn handle_notifications_socket(socket: WebSocket, state: AppState) {
    let (ws_sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<WsFrame>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let session = match authenticate(&state, &mut receiver).await {
        Ok(session) => session,
        Err(msg) => {
            let _ = send_frame(&tx, &WsServerMessage::error(msg)).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };
    let profile_id = session.profile.id.clone();
    info!(profile_id = %profile_id, "WebSocket notifications session started");

    let mut store = match NotificationStore::open(state.notifications.clone(), profile_id.clone())
        .await
    {
        Ok(store) => store,
        Err(e) => {
            let _ = send_frame(&tx, &WsServerMessage::error(e.to_string())).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    // Subscription drop on any exit path below tears down the feed channel.
    let mut subscription = match state.feed.subscribe_notifications(&profile_id).await {
        Ok(sub) => sub,
        Err(e) => {
            let _ = send_frame(&tx, &WsServerMessage::error(e.to_string())).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    let snapshot = WsServerMessage::NotificationSnapshot {
        notifications: store.items().to_vec(),
        unread: store.unread(),
    };
    if !send_frame(&tx, &snapshot).await {
        drop(tx);
        let _ = send_task.await;
        return;
    }

    let mut heartbeat = interval(WS_HEARTBEAT_INTERVAL);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            event = subscription.next() => {
                match event {
                    Some(ChangeEvent::NotificationInserted { row }) => {
                        last_activity = Instant::now();
                        if !store.apply_insert(row.clone()) {
                            continue;
                        }
                        metrics::record_ws_event_sent("notifications");
                        let frame = WsServerMessage::Notification {
                            notification: row,
                            unread: store.unread(),
                        };
                        if !send_frame(&tx, &frame).await {
                            warn!("WebSocket send failed, client disconnected");
                            break;
                        }
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            _ = heartbeat.tick() => {
                if last_activity.elapsed() > WS_HEARTBEAT_INTERVAL / 2 {
                    if tx.send(WsFrame::Ping(vec![])).await.is_err() {
                        warn!("Heartbeat failed, client disconnected");
                        break;
                    }
                }
            }
            client_msg = receiver.next() => {
                match client_msg {
                    Some(Ok(WsFrame::Pong(_))) => {
                        last_activity = Instant::now();
                    }
                    Some(Ok(WsFrame::Close(_))) | None => {
                        info!(profile_id = %profile_id, "Client closed connection");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
}

/// Live thread endpoint.
pub async fn ws_thread(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> impl IntoResponse {
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection("thread");

    ws.on_upgrade(|socket| async move {
        scopeguard::defer! {
            let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
            metrics::set_ws_active_connections(count);
        }
        handle_thread_socket(socket, state, thread_id).await;
    })
}

async fn handle_thread_socket(socket: WebSocket, state: AppState, thread_id: String) {
    let (ws_sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<WsFrame>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let session = match authenticate(&state, &mut receiver).await {
        Ok(session) => session,
        Err(msg) => {
            let _ = send_frame(&tx, &WsServerMessage::error(msg)).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };
    let viewer_id = session.profile.id.clone();

    let thread_id = ConnectionRequestId::from_string(thread_id);
    let thread_row = match state.connections.get(&thread_id).await {
        Ok(Some(row)) => row,
        Ok(None) => {
            let _ = send_frame(&tx, &WsServerMessage::error("Conversation not found")).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
        Err(e) => {
            let _ = send_frame(&tx, &WsServerMessage::error(e.to_string())).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    let mut thread = match MessageThread::open(
        state.messages.clone(),
        Arc::clone(&state.feed),
        state.dispatcher.clone(),
        thread_row,
        session.profile,
    )
    .await
    {
        Ok(thread) => thread,
        Err(e) => {
            let _ = send_frame(&tx, &WsServerMessage::error(e.to_string())).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };
    info!(thread_id = %thread_id, profile_id = %viewer_id, "WebSocket thread session started");

    let mut subscription = match state.feed.subscribe_messages(&thread_id).await {
        Ok(sub) => sub,
        Err(e) => {
            let _ = send_frame(&tx, &WsServerMessage::error(e.to_string())).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    let snapshot = WsServerMessage::ThreadSnapshot {
        messages: thread.items().to_vec(),
    };
    if !send_frame(&tx, &snapshot).await {
        drop(tx);
        let _ = send_task.await;
        return;
    }

    let mut heartbeat = interval(WS_HEARTBEAT_INTERVAL);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            event = subscription.next() => {
                match event {
                    Some(ChangeEvent::MessageInserted { row }) => {
                        last_activity = Instant::now();
                        if !thread.apply_insert(row.clone()) {
                            continue;
                        }
                        // The viewer is looking at the thread; incoming rows
                        // are read the moment they land.
                        if let Err(e) = thread.mark_incoming_read(&row.id).await {
                            warn!(thread_id = %thread_id, error = %e, "Failed to mark incoming message read");
                        }
                        metrics::record_ws_event_sent("thread");
                        let frame = WsServerMessage::Message { message: row };
                        if !send_frame(&tx, &frame).await {
                            warn!("WebSocket send failed, client disconnected");
                            break;
                        }
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            _ = heartbeat.tick() => {
                if last_activity.elapsed() > WS_HEARTBEAT_INTERVAL / 2 {
                    if tx.send(WsFrame::Ping(vec![])).await.is_err() {
                        warn!("Heartbeat failed, client disconnected");
                        break;
                    }
                }
            }
            client_msg = receiver.next() => {
                match client_msg {
                    Some(Ok(WsFrame::Pong(_))) => {
                        last_activity = Instant::now();
                    }
                    Some(Ok(WsFrame::Close(_))) | None => {
                        info!(thread_id = %thread_id, "Client closed connection");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
}
