use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, AppState};
use crate::integrations::{ContactMessage, IntegrationError};
use crate::DirectoryError;

#[derive(Deserialize)]
struct NewsletterSignup {
    #[serde(default)]
    email: String,
}

#[derive(Serialize)]
struct Outcome {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(contact))
        .route("/newsletter", post(subscribe))
}

async fn contact(
    State(state): State<AppState>,
    Json(message): Json<ContactMessage>,
) -> Result<Json<Outcome>, ApiError> {
    message.validate()?;
    state.contact.send(&message).await?;
    info!("Contact form relayed for {}", message.email);
    Ok(Json(Outcome {
        success: true,
        message: Some("Message sent successfully"),
    }))
}

async fn subscribe(
    State(state): State<AppState>,
    Json(signup): Json<NewsletterSignup>,
) -> Result<Json<Outcome>, ApiError> {
    let email = signup.email.trim();
    if !email.contains('@') {
        return Err(DirectoryError::validation("Invalid email address").into());
    }

    let subscription = state.newsletter.subscribe(email).await.map_err(|e| match e {
        IntegrationError::Api { status: 400, message } => DirectoryError::validation(message),
        other => other.into(),
    })?;
    Ok(Json(Outcome {
        success: true,
        message: Some(subscription.message()),
    }))
}
