//! Crawler files served at the site root

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::info;

use super::{ApiError, AppState};
use crate::sitemap::{SitemapBuilder, render_xml, robots_txt};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots))
}

async fn sitemap(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let agencies = state.directory.store().list_public_agencies().await?;
    let entries = SitemapBuilder::new(&state.public_base_url).build(&agencies);
    info!("Sitemap generated with {} URLs", entries.len());

    let xml = render_xml(&entries)?;
    Ok(([(CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.public_base_url),
    )
}
