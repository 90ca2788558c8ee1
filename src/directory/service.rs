//! Directory operations with ownership and role checks

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::filter::{AgencyFilter, AgencyPage};
use super::store::{AgencyUpdate, DirectoryStore};
use crate::geo::{CoordinateResolver, GeoPoint, GeographicSearch, canonical_city_name, country_name, resolve_country};
use crate::models::{AccessRequest, Agency, Experience, ReviewStatus, Service};
use crate::text::{contains_arabic, display_case, english_category, normalize, slugify};
use crate::{DirectoryError, Result};

/// Highest numeric suffix tried when a submitted title's slug is taken
const MAX_SLUG_ATTEMPTS: u32 = 50;

/// The signed-in user behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

/// A user-submitted agency
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NewAgency {
    pub title: String,
    pub description: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub category_name: Option<String>,
    /// Google Maps link
    pub url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NewService {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct NewExperience {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub duration: Option<String>,
    pub max_participants: Option<i32>,
    pub images: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AccessRequestInput {
    pub message: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
}

/// Agency page payload
#[derive(Debug, Clone)]
pub struct AgencyProfile {
    pub agency: Agency,
    pub location: Option<GeoPoint>,
    pub services: Vec<Service>,
    pub experiences: Vec<Experience>,
}

/// Filter dropdown values
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Facets {
    pub cities: Vec<String>,
    pub countries: Vec<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NearbyAgency {
    pub agency: Agency,
    pub location: GeoPoint,
    pub distance_km: f64,
}

pub struct DirectoryService {
    store: Arc<dyn DirectoryStore>,
    resolver: CoordinateResolver,
}

fn require_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(DirectoryError::forbidden("Admin access required"))
    }
}

fn require_manager(caller: &Caller, agency: &Agency) -> Result<()> {
    if caller.is_admin || agency.is_owned_by(&caller.user_id) {
        Ok(())
    } else {
        Err(DirectoryError::forbidden(
            "Only the agency owner or an admin can do this",
        ))
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl DirectoryService {
    #[must_use]
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self {
            store,
            resolver: CoordinateResolver::default(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }

    #[must_use]
    pub fn resolver(&self) -> &CoordinateResolver {
        &self.resolver
    }

    /// Who a bearer token belongs to; `None` for unknown or expired tokens
    pub async fn authenticate(&self, token: &str) -> Result<Option<Caller>> {
        let Some(user_id) = self.store.resolve_session(token).await? else {
            return Ok(None);
        };
        let is_admin = self
            .store
            .profile(&user_id)
            .await?
            .is_some_and(|p| p.is_admin);
        Ok(Some(Caller { user_id, is_admin }))
    }

    /// Listing search. Store failures are logged and yield an empty page.
    #[instrument(skip(self))]
    pub async fn search_agencies(&self, filter: &AgencyFilter) -> AgencyPage {
        match self.store.search_agencies(&filter.resolve()).await {
            Ok(page) => page,
            Err(e) => {
                error!("Agency search failed: {e}");
                AgencyPage::empty()
            }
        }
    }

    /// Profile page data. Hidden agencies are only shown to their owner and admins.
    pub async fn agency_profile(&self, slug: &str, caller: Option<&Caller>) -> Result<AgencyProfile> {
        let agency = self
            .store
            .agency_by_slug(slug)
            .await?
            .filter(|a| a.is_visible() || caller.is_some_and(|c| c.is_admin || a.is_owned_by(&c.user_id)))
            .ok_or_else(|| DirectoryError::not_found("Agency not found"))?;

        let (services, experiences) = tokio::try_join!(
            self.store.services_for(&agency.id),
            self.store.experiences_for(&agency.id)
        )?;

        Ok(AgencyProfile {
            location: self.resolver.resolve(&agency),
            agency,
            services,
            experiences,
        })
    }

    /// Unique cities, countries and categories of visible agencies
    pub async fn facets(&self, country: Option<&str>) -> Result<Facets> {
        let country = country
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(resolve_country);
        let rows = self.store.facet_rows(country.as_ref()).await?;

        let mut cities = BTreeSet::new();
        let mut countries = BTreeSet::new();
        let mut categories = BTreeSet::new();
        for row in rows {
            if let Some(city) = trimmed(row.city_normalized) {
                cities.insert(display_case(&canonical_city_name(&city)));
            }
            match (trimmed(row.country_code), trimmed(row.country_normalized)) {
                (Some(code), _) => {
                    countries.insert(country_name(&code));
                }
                (None, Some(name)) => {
                    countries.insert(display_case(&name));
                }
                (None, None) => {}
            }
            if let Some(category) = trimmed(row.category_normalized) {
                categories.insert(display_case(&category));
            }
        }

        Ok(Facets {
            cities: cities.into_iter().collect(),
            countries: countries.into_iter().collect(),
            categories: categories.into_iter().collect(),
        })
    }

    /// Home page picks: most reviewed agencies with Latin-script names
    pub async fn featured_agencies(&self, limit: u32) -> Result<Vec<Agency>> {
        let candidates = self.store.most_reviewed(limit.saturating_mul(4).max(limit)).await?;
        Ok(candidates
            .into_iter()
            .filter(|a| !contains_arabic(&a.title))
            .take(limit as usize)
            .collect())
    }

    /// Visible agencies with a resolvable position
    pub async fn map_markers(&self) -> Result<Vec<(Agency, GeoPoint)>> {
        let agencies = self.store.list_public_agencies().await?;
        Ok(agencies
            .into_iter()
            .filter_map(|agency| {
                let point = self.resolver.resolve(&agency)?;
                Some((agency, point))
            })
            .collect())
    }

    /// The `limit` closest agencies to `center`
    pub async fn nearby_agencies(&self, center: GeoPoint, limit: usize) -> Result<Vec<NearbyAgency>> {
        if !center.is_valid() {
            return Err(DirectoryError::validation("Coordinates out of range"));
        }
        let markers = self.map_markers().await?;
        let items = markers
            .into_iter()
            .map(|(agency, point)| ((agency, point), point))
            .collect();

        Ok(GeographicSearch::nearest(items, &center, limit)
            .into_iter()
            .map(|((agency, location), distance_km)| NearbyAgency {
                agency,
                location,
                distance_km,
            })
            .collect())
    }

    /// First free slug among `base`, `base-2`, `base-3`, ...
    async fn unique_slug(&self, title: &str) -> Result<String> {
        let base = match slugify(title) {
            s if s.is_empty() => "agency".to_string(),
            s => s,
        };
        if !self.store.slug_exists(&base).await? {
            return Ok(base);
        }
        for n in 2..=MAX_SLUG_ATTEMPTS {
            let candidate = format!("{base}-{n}");
            if !self.store.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Ok(format!("{base}-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Submit an agency for review; the submitter becomes its owner
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn submit_agency(&self, caller: &Caller, input: NewAgency) -> Result<Agency> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DirectoryError::validation("Title is required"));
        }

        let slug = self.unique_slug(&title).await?;
        let city = trimmed(input.city);
        let country_code = trimmed(input.country_code).map(|c| c.to_uppercase());
        let category_name = trimmed(input.category_name);
        let url = trimmed(input.url);

        let mut agency = Agency {
            slug,
            title,
            description: trimmed(input.description),
            street: trimmed(input.street),
            city_normalized: city.as_deref().map(|c| normalize(&canonical_city_name(c))),
            city,
            state: trimmed(input.state),
            country_normalized: country_code.as_deref().map(|c| normalize(&country_name(c))),
            country_code,
            category_normalized: category_name
                .as_deref()
                .map(|c| normalize(&english_category(Some(c)))),
            category_name,
            phone: trimmed(input.phone),
            website: trimmed(input.website),
            email: trimmed(input.email),
            url,
            latitude: input.latitude,
            longitude: input.longitude,
            total_score: Some(0.0),
            reviews_count: Some(0),
            owner_id: Some(caller.user_id.clone()),
            status: ReviewStatus::Pending,
            ..Default::default()
        };

        if agency.stored_point().is_none()
            && let Some((point, _)) = self.resolver.resolve_with_source(&Agency {
                city_normalized: None,
                city: None,
                ..agency.clone()
            })
        {
            agency.latitude = Some(point.lat);
            agency.longitude = Some(point.lng);
        }

        let stored = self
            .store
            .insert_agencies(std::slice::from_ref(&agency))
            .await?
            .into_iter()
            .next()
            .unwrap_or(agency);
        info!(slug = %stored.slug, "Agency submitted for review");
        Ok(stored)
    }

    async fn existing_agency(&self, id: &str) -> Result<Agency> {
        self.store
            .agency_by_id(id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("Agency not found"))
    }

    /// Owner or admin edit. Moderation fields are admin only.
    pub async fn update_agency(&self, caller: &Caller, id: &str, mut update: AgencyUpdate) -> Result<Agency> {
        let agency = self.existing_agency(id).await?;
        require_manager(caller, &agency)?;
        if update.touches_admin_fields() {
            require_admin(caller)?;
        }
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DirectoryError::validation("Title cannot be empty"));
        }

        update.city_normalized = update.city.as_deref().map(|city| normalize(&canonical_city_name(city)));
        update.category_normalized = update
            .category_name
            .as_deref()
            .map(|category| normalize(&english_category(Some(category))));

        self.store.update_agency(id, &update).await?;
        self.existing_agency(id).await
    }

    pub async fn add_service(&self, caller: &Caller, agency_id: &str, input: NewService) -> Result<Service> {
        let agency = self.existing_agency(agency_id).await?;
        require_manager(caller, &agency)?;
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DirectoryError::validation("Service name is required"));
        }

        self.store
            .insert_service(&Service {
                id: String::new(),
                agency_id: agency.id,
                name,
                description: trimmed(input.description),
                icon: trimmed(input.icon),
            })
            .await
    }

    pub async fn add_experience(&self, caller: &Caller, agency_id: &str, input: NewExperience) -> Result<Experience> {
        let agency = self.existing_agency(agency_id).await?;
        require_manager(caller, &agency)?;
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DirectoryError::validation("Experience title is required"));
        }
        if input.price.is_some_and(|p| p < 0.0) {
            return Err(DirectoryError::validation("Price cannot be negative"));
        }
        if input.max_participants.is_some_and(|m| m < 1) {
            return Err(DirectoryError::validation("Max participants must be at least 1"));
        }

        self.store
            .insert_experience(&Experience {
                id: String::new(),
                agency_id: agency.id,
                title,
                description: trimmed(input.description),
                location: trimmed(input.location),
                price: input.price,
                currency: trimmed(input.currency).or_else(|| Some("USD".to_string())),
                duration: trimmed(input.duration),
                max_participants: input.max_participants,
                images: input.images,
            })
            .await
    }

    pub async fn delete_service(&self, caller: &Caller, id: &str) -> Result<()> {
        let service = self
            .store
            .service_by_id(id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("Service not found"))?;
        if !caller.is_admin {
            let agency = self.existing_agency(&service.agency_id).await?;
            require_manager(caller, &agency)?;
        }
        self.store.delete_service(id).await
    }

    pub async fn delete_experience(&self, caller: &Caller, id: &str) -> Result<()> {
        let experience = self
            .store
            .experience_by_id(id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("Experience not found"))?;
        if !caller.is_admin {
            let agency = self.existing_agency(&experience.agency_id).await?;
            require_manager(caller, &agency)?;
        }
        self.store.delete_experience(id).await
    }

    /// Claim an agency. One request per user and agency.
    pub async fn request_access(
        &self,
        caller: &Caller,
        agency_id: &str,
        input: AccessRequestInput,
    ) -> Result<AccessRequest> {
        let agency = self.existing_agency(agency_id).await?;
        if agency.is_owned_by(&caller.user_id) {
            return Err(DirectoryError::conflict("You already manage this agency."));
        }

        let profile = self.store.profile(&caller.user_id).await?;
        let request = AccessRequest {
            agency_id: agency.id,
            user_id: caller.user_id.clone(),
            user_email: trimmed(input.user_email).or_else(|| profile.as_ref().and_then(|p| p.email.clone())),
            user_name: trimmed(input.user_name).or_else(|| profile.as_ref().and_then(|p| p.full_name.clone())),
            message: trimmed(input.message),
            status: ReviewStatus::Pending,
            ..Default::default()
        };
        self.store.insert_access_request(&request).await
    }

    pub async fn list_access_requests(
        &self,
        caller: &Caller,
        status: Option<ReviewStatus>,
    ) -> Result<Vec<AccessRequest>> {
        require_admin(caller)?;
        self.store.list_access_requests(status).await
    }

    /// Hand the agency to the requester, then mark the request approved.
    ///
    /// The two writes are independent; a failure in the second leaves the
    /// owner assigned and the request pending.
    #[instrument(skip(self, caller))]
    pub async fn approve_access_request(&self, caller: &Caller, request_id: &str) -> Result<()> {
        require_admin(caller)?;
        let request = self
            .store
            .access_request_by_id(request_id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("Request not found"))?;

        self.store
            .assign_owner(&request.agency_id, &request.user_id)
            .await?;
        self.store
            .update_access_request_status(request_id, ReviewStatus::Approved, Utc::now())
            .await
            .inspect_err(|e| warn!("Owner assigned but request status not updated: {e}"))?;

        info!(agency = %request.agency_id, user = %request.user_id, "Access request approved");
        Ok(())
    }

    pub async fn reject_access_request(&self, caller: &Caller, request_id: &str) -> Result<()> {
        require_admin(caller)?;
        if self.store.access_request_by_id(request_id).await?.is_none() {
            return Err(DirectoryError::not_found("Request not found"));
        }
        self.store
            .update_access_request_status(request_id, ReviewStatus::Rejected, Utc::now())
            .await
    }

    pub async fn soft_delete_agency(&self, caller: &Caller, id: &str) -> Result<()> {
        require_admin(caller)?;
        self.existing_agency(id).await?;
        self.store.set_deleted(id, Some(Utc::now())).await?;
        info!(agency = %id, "Agency soft-deleted");
        Ok(())
    }

    pub async fn restore_agency(&self, caller: &Caller, id: &str) -> Result<()> {
        require_admin(caller)?;
        self.existing_agency(id).await?;
        self.store.set_deleted(id, None).await?;
        info!(agency = %id, "Agency restored");
        Ok(())
    }

    /// Fails with `Forbidden` unless the caller is an admin
    pub fn ensure_admin(&self, caller: &Caller) -> Result<()> {
        require_admin(caller)
    }
}
