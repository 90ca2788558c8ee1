use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::ResolvedFilter;
use super::AgencyPage;
use crate::Result;
use crate::models::{AccessRequest, Agency, Experience, Profile, ReviewStatus, Service};

/// Editable agency fields; `None` leaves a column untouched
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AgencyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Derived from the raw column on update
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub category_normalized: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Derived from the raw column on update
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub city_normalized: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Admin only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    /// Admin only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    /// Admin only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
}

impl AgencyUpdate {
    /// Apply to an in-memory record
    pub fn apply_to(&self, agency: &mut Agency) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        fn set_opt<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        set(&mut agency.title, &self.title);
        set_opt(&mut agency.description, &self.description);
        set_opt(&mut agency.category_name, &self.category_name);
        set_opt(&mut agency.category_normalized, &self.category_normalized);
        set_opt(&mut agency.street, &self.street);
        set_opt(&mut agency.city, &self.city);
        set_opt(&mut agency.city_normalized, &self.city_normalized);
        set_opt(&mut agency.state, &self.state);
        set_opt(&mut agency.phone, &self.phone);
        set_opt(&mut agency.website, &self.website);
        set_opt(&mut agency.email, &self.email);
        set_opt(&mut agency.image_url, &self.image_url);
        set_opt(&mut agency.url, &self.url);
        set_opt(&mut agency.latitude, &self.latitude);
        set_opt(&mut agency.longitude, &self.longitude);
        set(&mut agency.featured, &self.featured);
        set(&mut agency.verified, &self.verified);
        set(&mut agency.status, &self.status);
    }

    #[must_use]
    pub fn touches_admin_fields(&self) -> bool {
        self.featured.is_some() || self.verified.is_some() || self.status.is_some()
    }
}

/// Columns needed for the facet lists
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct FacetRow {
    pub city_normalized: Option<String>,
    pub country_code: Option<String>,
    pub country_normalized: Option<String>,
    pub category_normalized: Option<String>,
}

/// Persistence seam for directory records.
///
/// Implemented by the hosted table API and by an in-process store used for
/// local JSON data and tests. Visibility rules live in the filter; lookups
/// by slug or id return hidden records too so owners and admins can see them.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn search_agencies(&self, filter: &ResolvedFilter) -> Result<AgencyPage>;

    async fn agency_by_slug(&self, slug: &str) -> Result<Option<Agency>>;

    async fn agency_by_id(&self, id: &str) -> Result<Option<Agency>>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    /// Bulk insert; returns the stored rows
    async fn insert_agencies(&self, agencies: &[Agency]) -> Result<Vec<Agency>>;

    async fn update_agency(&self, id: &str, update: &AgencyUpdate) -> Result<()>;

    async fn assign_owner(&self, agency_id: &str, owner_id: &str) -> Result<()>;

    /// Soft delete (`Some`) or restore (`None`)
    async fn set_deleted(&self, agency_id: &str, deleted_at: Option<DateTime<Utc>>) -> Result<()>;

    /// Facet columns of visible agencies, optionally restricted to one country
    async fn facet_rows(&self, country: Option<&crate::geo::Country>) -> Result<Vec<FacetRow>>;

    /// Visible agencies ordered by review count, then rating
    async fn most_reviewed(&self, limit: u32) -> Result<Vec<Agency>>;

    /// Every visible agency (sitemap, map markers)
    async fn list_public_agencies(&self) -> Result<Vec<Agency>>;

    async fn services_for(&self, agency_id: &str) -> Result<Vec<Service>>;

    async fn experiences_for(&self, agency_id: &str) -> Result<Vec<Experience>>;

    async fn service_by_id(&self, id: &str) -> Result<Option<Service>>;

    async fn experience_by_id(&self, id: &str) -> Result<Option<Experience>>;

    async fn insert_service(&self, service: &Service) -> Result<Service>;

    async fn insert_experience(&self, experience: &Experience) -> Result<Experience>;

    async fn delete_service(&self, id: &str) -> Result<()>;

    async fn delete_experience(&self, id: &str) -> Result<()>;

    /// Fails with `Conflict` when the user already asked for this agency
    async fn insert_access_request(&self, request: &AccessRequest) -> Result<AccessRequest>;

    async fn access_request_by_id(&self, id: &str) -> Result<Option<AccessRequest>>;

    async fn list_access_requests(&self, status: Option<ReviewStatus>) -> Result<Vec<AccessRequest>>;

    async fn update_access_request_status(
        &self,
        id: &str,
        status: ReviewStatus,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn profile(&self, user_id: &str) -> Result<Option<Profile>>;

    /// Map a bearer token to the signed-in user id
    async fn resolve_session(&self, token: &str) -> Result<Option<String>>;
}
