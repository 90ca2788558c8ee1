use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{self, AppState};
use crate::cache::PersistentCache;
use crate::chat::ChatSessionStore;
use crate::config::{DataBackend, DirectoryConfig};
use crate::contacted::ContactedTracker;
use crate::directory::{DirectoryService, DirectoryStore, InMemoryStore, PostgrestStore};
use crate::http::build_client;
use crate::integrations::{ChatCompletionClient, ContactRelay, NewsletterClient, SerpApiClient};
use crate::seed;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Open the configured directory store. The memory backend imports the
/// seed file when one exists.
pub async fn open_store(config: &DirectoryConfig) -> Result<Arc<dyn DirectoryStore>> {
    match config.data.backend {
        DataBackend::Hosted => {
            let client = build_client(&config.http)?;
            Ok(Arc::new(PostgrestStore::new(&config.data, client)?))
        }
        DataBackend::Memory => {
            let store = InMemoryStore::new();
            let seed_file = Path::new(&config.data.seed_file);
            if seed_file.exists() {
                let report = seed::seed_from_file(&store, seed_file, config.seed.batch_size as usize, |_| {})
                    .await
                    .with_context(|| format!("Failed to import {}", seed_file.display()))?;
                info!("Memory store holds {} agencies", report.inserted);
            } else {
                warn!("Seed file {} not found; starting with an empty directory", seed_file.display());
            }
            Ok(Arc::new(store))
        }
    }
}

pub async fn build_state(config: &DirectoryConfig) -> Result<AppState> {
    let client = build_client(&config.http)?;
    let cache = PersistentCache::open(config.cache_path())
        .with_context(|| format!("Failed to open cache at {}", config.cache_path().display()))?;

    let directory = Arc::new(DirectoryService::new(open_store(config).await?));
    let serp = Arc::new(SerpApiClient::new(&config.serp, client.clone()));
    let assistant = Arc::new(ChatCompletionClient::azure(&config.chat, client.clone()));
    let writer = Arc::new(ChatCompletionClient::openai(&config.openai, client.clone()));

    Ok(AppState {
        directory,
        flights: serp.clone(),
        hotels: serp,
        writer,
        chat: ChatSessionStore::new(cache.clone(), assistant, &config.chat),
        contacted: Arc::new(ContactedTracker::new(cache)),
        contact: ContactRelay::new(&config.contact, client.clone()),
        newsletter: NewsletterClient::new(&config.newsletter, client),
        public_base_url: config.server.public_base_url.clone(),
    })
}

/// API under `/api`, crawler files at the root, static frontend as fallback
pub fn app(state: AppState, static_dir: Option<&str>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .nest("/api", api::router())
        .merge(api::seo::router());
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

pub async fn run(config: DirectoryConfig) -> Result<()> {
    let state = build_state(&config).await?;
    let app = app(state, config.server.static_dir.as_deref());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Web server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
    }
}
