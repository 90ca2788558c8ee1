//! Bearer-token callers

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::{ApiError, AppState};
use crate::DirectoryError;
use crate::directory::Caller;

/// A signed-in caller; rejects with 401 otherwise
pub struct SignedIn(pub Caller);

/// The caller if the request carries a valid token
pub struct MaybeCaller(pub Option<Caller>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for MaybeCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeCaller(None));
        };
        Ok(MaybeCaller(state.directory.authenticate(token).await?))
    }
}

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match MaybeCaller::from_request_parts(parts, state).await? {
            MaybeCaller(Some(caller)) => Ok(SignedIn(caller)),
            MaybeCaller(None) => Err(ApiError(DirectoryError::Unauthenticated)),
        }
    }
}
