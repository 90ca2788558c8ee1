use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, SignedIn};
use crate::contacted::{ContactedAgency, ContactedMap};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkRequest {
    #[serde(default)]
    id: String,
    #[serde(default)]
    contacted: bool,
    contacted_by: Option<String>,
}

#[derive(Serialize)]
struct Marked {
    success: bool,
    data: Option<ContactedAgency>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/contacted-agencies", get(list).post(mark))
}

async fn list(State(state): State<AppState>, SignedIn(caller): SignedIn) -> Result<Json<ContactedMap>, ApiError> {
    state.directory.ensure_admin(&caller)?;
    Ok(Json(state.contacted.all().await?))
}

async fn mark(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Json(request): Json<MarkRequest>,
) -> Result<Json<Marked>, ApiError> {
    state.directory.ensure_admin(&caller)?;
    let data = state
        .contacted
        .mark(&request.id, request.contacted, request.contacted_by.as_deref())
        .await?;
    Ok(Json(Marked { success: true, data }))
}
