//! Data models for the travel directory
//!
//! This module contains the core domain models organized by concern:
//! - Agency: directory records and their review status
//! - Listing: agency-owned services and experiences, access requests, profiles
//! - Itinerary: generated trip plans and the overlays applied to them
//! - Location: geographic points

pub mod agency;
pub mod itinerary;
pub mod listing;
pub mod location;

// Re-export all public types for convenient access
pub use agency::{Agency, ReviewStatus};
pub use itinerary::{
    Accommodation, AccommodationOverlay, PlannerInputs, Transport, TransportKind,
    TransportOverlay, TripDay, TripItinerary, TripTag,
};
pub use listing::{AccessRequest, Experience, Profile, Service};
pub use location::GeoPoint;
