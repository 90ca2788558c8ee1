//! JSON API served under `/api`

mod admin;
mod agencies;
mod auth;
mod chat;
mod contact;
mod contacted;
mod error;
mod planner;
pub mod seo;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::chat::ChatSessionStore;
use crate::contacted::ContactedTracker;
use crate::directory::DirectoryService;
use crate::integrations::{ChatModel, ContactRelay, NewsletterClient};
use crate::planner::{FlightSearch, HotelSearch};

pub use agencies::ApiAgency;
pub use auth::{MaybeCaller, SignedIn};
pub use error::ApiError;

/// Everything a handler can reach
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<DirectoryService>,
    pub flights: Arc<dyn FlightSearch>,
    pub hotels: Arc<dyn HotelSearch>,
    /// Writes agency descriptions for the admin form
    pub writer: Arc<dyn ChatModel>,
    pub chat: ChatSessionStore,
    pub contacted: Arc<ContactedTracker>,
    pub contact: ContactRelay,
    pub newsletter: NewsletterClient,
    /// Origin used for sitemap and robots URLs
    pub public_base_url: String,
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The planner route sits outside the request timeout; its batch waits on
/// the outbound client timeouts alone.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(agencies::router())
        .merge(chat::router())
        .merge(contact::router())
        .merge(admin::router())
        .merge(contacted::router())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .merge(planner::router())
}
