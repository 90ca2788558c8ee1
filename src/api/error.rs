use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use crate::DirectoryError;
use crate::integrations::IntegrationError;

/// Where the frontend sends visitors who need to sign in
const LOGIN_PATH: &str = "/auth/login";

/// A [`DirectoryError`] rendered as `{"error": ...}` with a matching status
#[derive(Debug)]
pub struct ApiError(pub DirectoryError);

impl<E: Into<DirectoryError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DirectoryError::Validation { .. } => StatusCode::BAD_REQUEST,
            DirectoryError::Unauthenticated => StatusCode::UNAUTHORIZED,
            DirectoryError::Forbidden { .. } => StatusCode::FORBIDDEN,
            DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
            DirectoryError::Conflict { .. } => StatusCode::CONFLICT,
            DirectoryError::Api {
                source: IntegrationError::NotConfigured(_),
            } => StatusCode::INTERNAL_SERVER_ERROR,
            DirectoryError::Api { .. } => StatusCode::BAD_GATEWAY,
            DirectoryError::Config { .. }
            | DirectoryError::Storage { .. }
            | DirectoryError::Cache { .. }
            | DirectoryError::Io { .. }
            | DirectoryError::General { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            // handlers word these for the visitor already
            DirectoryError::Config { message } | DirectoryError::Validation { message } => {
                message.clone()
            }
            other => other.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = match &self.0 {
            DirectoryError::Unauthenticated => json!({
                "error": self.message(),
                "login": LOGIN_PATH,
            }),
            _ => json!({ "error": self.message() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DirectoryError::validation("bad"), StatusCode::BAD_REQUEST)]
    #[case(DirectoryError::Unauthenticated, StatusCode::UNAUTHORIZED)]
    #[case(DirectoryError::forbidden("no"), StatusCode::FORBIDDEN)]
    #[case(DirectoryError::not_found("gone"), StatusCode::NOT_FOUND)]
    #[case(DirectoryError::conflict("taken"), StatusCode::CONFLICT)]
    #[case(DirectoryError::storage("down"), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(
        DirectoryError::from(IntegrationError::NotConfigured("SerpApi".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[case(
        DirectoryError::from(IntegrationError::Network("timeout".to_string())),
        StatusCode::BAD_GATEWAY
    )]
    fn test_status_mapping(#[case] error: DirectoryError, #[case] expected: StatusCode) {
        assert_eq!(ApiError(error).status(), expected);
    }

    #[test]
    fn test_config_errors_keep_their_wording() {
        let error = ApiError(DirectoryError::config("Chat service is not configured."));
        assert_eq!(error.message(), "Chat service is not configured.");

        let error = ApiError(DirectoryError::validation("Invalid email address"));
        assert_eq!(error.message(), "Invalid email address");
    }
}
