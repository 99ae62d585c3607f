//! In-app notification handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use finlink_models::{Notification, NotificationId};

use crate::error::ApiResult;
use crate::services::NotificationStore;
use crate::session::Session;
use crate::state::AppState;

#[derive(Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

/// Recent notifications for the session profile, newest first.
pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<NotificationListResponse>> {
    let store = NotificationStore::open(state.notifications.clone(), session.profile.id).await?;
    Ok(Json(NotificationListResponse {
        unread: store.unread(),
        notifications: store.items().to_vec(),
    }))
}

#[derive(Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub unread: usize,
}

/// Mark one notification read.
pub async fn mark_read(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> ApiResult<Json<MarkReadResponse>> {
    let mut store =
        NotificationStore::open(state.notifications.clone(), session.profile.id).await?;
    store.mark_as_read(&NotificationId::from_string(id)).await?;
    Ok(Json(MarkReadResponse {
        success: true,
        unread: store.unread(),
    }))
}

/// Mark every notification for the session profile read.
pub async fn mark_all_read(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<MarkReadResponse>> {
    let mut store =
        NotificationStore::open(state.notifications.clone(), session.profile.id).await?;
    store.mark_all_read().await?;
    Ok(Json(MarkReadResponse {
        success: true,
        unread: 0,
    }))
}
