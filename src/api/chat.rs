use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState};
use crate::chat::AgencyContext;
use crate::directory::AgencyProfile;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct OpenSession {
    context: Option<AgencyContext>,
    /// Builds the context server-side when no explicit context is sent
    agency_slug: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionOpened {
    session_id: String,
}

#[derive(Deserialize)]
struct UserMessage {
    message: String,
}

#[derive(Serialize)]
struct Reply {
    message: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat/sessions", post(open))
        .route("/chat/sessions/{id}", delete(close))
        .route("/chat/sessions/{id}/messages", post(send))
}

fn profile_context(profile: AgencyProfile) -> AgencyContext {
    let agency = profile.agency;
    AgencyContext {
        name: agency.title,
        country: agency.country_code.as_deref().map(crate::geo::country_name),
        city: agency.city,
        services: profile.services.into_iter().map(|s| s.name).collect(),
        experiences: profile.experiences.into_iter().map(|e| e.title).collect(),
        phone: agency.phone,
        email: agency.email,
        website: agency.website,
    }
}

async fn open(
    State(state): State<AppState>,
    body: Option<Json<OpenSession>>,
) -> Result<(StatusCode, Json<SessionOpened>), ApiError> {
    let Json(request) = body.unwrap_or_default();

    let context = match (request.context, request.agency_slug) {
        (Some(context), _) => Some(context),
        (None, Some(slug)) => Some(profile_context(state.directory.agency_profile(&slug, None).await?)),
        (None, None) => None,
    };

    let session = state.chat.open(context).await?;
    Ok((StatusCode::CREATED, Json(SessionOpened { session_id: session.id })))
}

async fn send(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(message): Json<UserMessage>,
) -> Result<Json<Reply>, ApiError> {
    let reply = state.chat.send(&id, &message.message).await?;
    Ok(Json(Reply { message: reply }))
}

async fn close(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    state.chat.close(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
