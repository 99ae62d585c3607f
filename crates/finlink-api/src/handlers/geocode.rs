//! Address autocomplete proxy.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::services::GeocodePlace;
use crate::session::AuthUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

#[derive(Serialize)]
pub struct GeocodeResponse {
    pub results: Vec<GeocodePlace>,
}

/// Free-text address search. Requires an authenticated caller so the
/// upstream service only ever sees traffic we can account for.
pub async fn search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<GeocodeQuery>,
) -> ApiResult<Json<GeocodeResponse>> {
    let results = state.geocode.search(&query.q).await?;
    Ok(Json(GeocodeResponse { results }))
}
