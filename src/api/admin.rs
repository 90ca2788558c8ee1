//! Moderation endpoints. Everything here needs a signed-in caller; the
//! directory service enforces the admin role where it applies.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, AppState, SignedIn};
use crate::integrations::{IntegrationError, generate_description};
use crate::models::{AccessRequest, ReviewStatus};
use crate::DirectoryError;

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<ReviewStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestDecision {
    request_id: String,
}

#[derive(Deserialize)]
struct IdQuery {
    id: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct DescriptionRequest {
    title: String,
    category: String,
    location: Option<String>,
}

#[derive(Serialize)]
struct Description {
    description: String,
}

#[derive(Serialize)]
struct Done {
    success: bool,
}

fn done() -> Json<Done> {
    Json(Done { success: true })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/access-requests", get(access_requests))
        .route("/admin/access-requests/approve", post(approve))
        .route("/admin/access-requests/reject", post(reject))
        .route("/admin/agencies", delete(delete_agency))
        .route("/admin/agencies/restore", post(restore_agency))
        .route("/admin/agencies/generate-description", post(describe))
        .route("/admin/services", delete(delete_service))
        .route("/admin/experiences", delete(delete_experience))
}

async fn access_requests(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<AccessRequest>>, ApiError> {
    Ok(Json(state.directory.list_access_requests(&caller, query.status).await?))
}

async fn approve(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Json(decision): Json<RequestDecision>,
) -> Result<Json<Done>, ApiError> {
    state
        .directory
        .approve_access_request(&caller, &decision.request_id)
        .await?;
    Ok(done())
}

async fn reject(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Json(decision): Json<RequestDecision>,
) -> Result<Json<Done>, ApiError> {
    state
        .directory
        .reject_access_request(&caller, &decision.request_id)
        .await?;
    info!(request = %decision.request_id, "Access request rejected");
    Ok(done())
}

async fn delete_agency(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Query(query): Query<IdQuery>,
) -> Result<Json<Done>, ApiError> {
    state.directory.soft_delete_agency(&caller, &query.id).await?;
    Ok(done())
}

async fn restore_agency(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Query(query): Query<IdQuery>,
) -> Result<Json<Done>, ApiError> {
    state.directory.restore_agency(&caller, &query.id).await?;
    Ok(done())
}

async fn delete_service(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Query(query): Query<IdQuery>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete_service(&caller, &query.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_experience(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Query(query): Query<IdQuery>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete_experience(&caller, &query.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// AI-written description for the agency form. Any signed-in user may ask.
async fn describe(
    State(state): State<AppState>,
    SignedIn(_caller): SignedIn,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<Description>, ApiError> {
    if !state.writer.is_configured() {
        return Err(DirectoryError::config("AI service not configured").into());
    }
    let title = request.title.trim();
    let category = request.category.trim();
    if title.is_empty() || category.is_empty() {
        return Err(DirectoryError::validation("Title and category are required").into());
    }

    let location = request.location.as_deref().map(str::trim).filter(|l| !l.is_empty());
    let description = generate_description(state.writer.as_ref(), title, category, location)
        .await
        .map_err(|e| match e {
            IntegrationError::NotConfigured(_) => DirectoryError::config("AI service not configured"),
            other => other.into(),
        })?
        .ok_or_else(|| DirectoryError::general("Failed to generate description"))?;

    Ok(Json(Description { description }))
}
