//! Verification score and badge for the session profile.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use finlink_models::{score_percent, VerificationBadge, VerificationChecks};

use crate::error::ApiResult;
use crate::session::Session;
use crate::state::AppState;

#[derive(Serialize)]
pub struct VerificationResponse {
    pub score_percent: u8,
    pub badge: VerificationBadge,
    pub hint: &'static str,
    pub checks: VerificationChecks,
}

/// Score, badge, and hint for the session profile.
///
/// A profile with no verification row yet scores 0 and shows the
/// awaiting-review badge.
pub async fn get(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<VerificationResponse>> {
    let record = state
        .verifications
        .for_profile(&session.profile.id)
        .await?
        .unwrap_or_else(|| finlink_supabase::VerificationRecord {
            profile_id: session.profile.id.clone(),
            checks: VerificationChecks::default(),
            approval_status: Default::default(),
        });

    let badge = VerificationBadge::from_approval(record.approval_status);
    Ok(Json(VerificationResponse {
        score_percent: score_percent(&record.checks),
        badge,
        hint: badge.hint(),
        checks: record.checks,
    }))
}
