//! Messaging thread handlers.
//!
//! Threads are keyed by connection request id; only the two parties may
//! read or write. Reading a thread marks the other party's rows read.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use finlink_models::{ConnectionRequestId, Message};

use crate::error::{ApiError, ApiResult};
use crate::services::MessageThread;
use crate::session::Session;
use crate::state::AppState;

async fn open_thread(
    state: &AppState,
    session: Session,
    thread_id: String,
) -> ApiResult<MessageThread> {
    let thread_id = ConnectionRequestId::from_string(thread_id);
    let thread = state
        .connections
        .get(&thread_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

    MessageThread::open(
        state.messages.clone(),
        Arc::clone(&state.feed),
        state.dispatcher.clone(),
        thread,
        session.profile,
    )
    .await
}

#[derive(Serialize)]
pub struct ThreadResponse {
    pub messages: Vec<Message>,
}

/// Full thread history, oldest first.
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread = open_thread(&state, session, thread_id).await?;
    Ok(Json(ThreadResponse {
        messages: thread.items().to_vec(),
    }))
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: Message,
}

/// Append a message to the thread.
///
/// Whitespace-only content is rejected here; the store-level no-op is
/// for live sessions where a silent drop is the friendlier behavior.
pub async fn send(
    State(state): State<AppState>,
    session: Session,
    Path(thread_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let mut thread = open_thread(&state, session, thread_id).await?;
    let Some(message) = thread.send(&request.content).await? else {
        return Err(ApiError::Validation("content must not be empty".to_string()));
    };
    Ok(Json(SendMessageResponse {
        success: true,
        message,
    }))
}
