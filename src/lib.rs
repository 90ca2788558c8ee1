//! Travel directory - multi-locale directory of travel agencies
//!
//! This library provides agency search and profile management, the claim
//! workflow, map coordinate resolution and an itinerary planner that
//! overlays live flight and hotel prices onto generated trips.

pub mod api;
pub mod cache;
pub mod chat;
pub mod config;
pub mod contacted;
pub mod directory;
pub mod error;
pub mod geo;
pub mod http;
pub mod integrations;
pub mod models;
pub mod planner;
pub mod seed;
pub mod sitemap;
pub mod telemetry;
pub mod text;
pub mod web;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use config::DirectoryConfig;
pub use directory::{AgencyFilter, AgencyPage, DirectoryService, DirectoryStore};
pub use error::DirectoryError;
pub use geo::{CoordinateResolver, GeoPoint};
pub use integrations::IntegrationError;
pub use models::{Agency, TripItinerary};
pub use planner::enrich_itineraries;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, DirectoryError>;
