//! Agency directory: search semantics, storage backends and the operations
//! built on them (submissions, edits, claims, moderation)

pub mod filter;
pub mod memory;
pub mod postgrest;
pub mod service;
pub mod store;

pub use filter::{AgencyFilter, AgencyPage, ResolvedFilter, WebsiteFilter};
pub use memory::InMemoryStore;
pub use postgrest::PostgrestStore;
pub use service::{
    AccessRequestInput, AgencyProfile, Caller, DirectoryService, Facets, NearbyAgency, NewAgency,
    NewExperience, NewService,
};
pub use store::{AgencyUpdate, DirectoryStore, FacetRow};
