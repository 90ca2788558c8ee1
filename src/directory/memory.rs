//! In-process directory store
//!
//! Runs the directory without a data service (filled by the seed import)
//! and backs the test suite. Bearer tokens are taken to be user ids of known
//! profiles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::filter::{ResolvedFilter, listing_order};
use super::store::{AgencyUpdate, DirectoryStore, FacetRow};
use super::AgencyPage;
use crate::geo::Country;
use crate::models::{AccessRequest, Agency, Experience, Profile, ReviewStatus, Service};
use crate::{DirectoryError, Result};

#[derive(Default)]
struct Tables {
    agencies: Vec<Agency>,
    services: Vec<Service>,
    experiences: Vec<Experience>,
    access_requests: Vec<AccessRequest>,
    profiles: Vec<Profile>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

fn new_id(id: &str) -> String {
    if id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id.to_string()
    }
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_agencies(agencies: Vec<Agency>) -> Self {
        let agencies = agencies
            .into_iter()
            .map(|mut agency| {
                agency.id = new_id(&agency.id);
                agency
            })
            .collect();
        Self {
            tables: RwLock::new(Tables {
                agencies,
                ..Default::default()
            }),
        }
    }

    /// Register a user; their id doubles as their bearer token
    pub fn add_profile(&self, profile: Profile) -> Result<()> {
        self.write()?.profiles.push(profile);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| DirectoryError::storage("directory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| DirectoryError::storage("directory store lock poisoned"))
    }

    fn with_agency_mut(&self, id: &str, f: impl FnOnce(&mut Agency)) -> Result<()> {
        let mut tables = self.write()?;
        let agency = tables
            .agencies
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| DirectoryError::not_found("Agency not found"))?;
        f(agency);
        Ok(())
    }
}

fn country_matches(row: &Agency, country: &Country) -> bool {
    [row.country_code.as_deref(), row.country_normalized.as_deref()]
        .into_iter()
        .flatten()
        .any(|v| v.eq_ignore_ascii_case(&country.code) || v.eq_ignore_ascii_case(&country.name))
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn search_agencies(&self, filter: &ResolvedFilter) -> Result<AgencyPage> {
        let tables = self.read()?;
        let mut matches: Vec<&Agency> = tables.agencies.iter().filter(|a| filter.matches(a)).collect();
        matches.sort_by(|a, b| listing_order(a, b));

        let total = matches.len() as u64;
        let offset = usize::try_from(filter.offset).unwrap_or(usize::MAX);
        let agencies = matches
            .into_iter()
            .skip(offset)
            .take(filter.limit as usize)
            .cloned()
            .collect();

        Ok(AgencyPage { agencies, total })
    }

    async fn agency_by_slug(&self, slug: &str) -> Result<Option<Agency>> {
        Ok(self.read()?.agencies.iter().find(|a| a.slug == slug).cloned())
    }

    async fn agency_by_id(&self, id: &str) -> Result<Option<Agency>> {
        Ok(self.read()?.agencies.iter().find(|a| a.id == id).cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.read()?.agencies.iter().any(|a| a.slug == slug))
    }

    async fn insert_agencies(&self, agencies: &[Agency]) -> Result<Vec<Agency>> {
        let mut tables = self.write()?;
        if let Some(dup) = agencies
            .iter()
            .find(|new| tables.agencies.iter().any(|a| a.slug == new.slug))
        {
            return Err(DirectoryError::conflict(format!(
                "An agency with slug '{}' already exists",
                dup.slug
            )));
        }

        let now = Utc::now();
        let stored: Vec<Agency> = agencies
            .iter()
            .cloned()
            .map(|mut agency| {
                agency.id = new_id(&agency.id);
                agency.created_at.get_or_insert(now);
                agency
            })
            .collect();
        tables.agencies.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update_agency(&self, id: &str, update: &AgencyUpdate) -> Result<()> {
        self.with_agency_mut(id, |agency| update.apply_to(agency))
    }

    async fn assign_owner(&self, agency_id: &str, owner_id: &str) -> Result<()> {
        self.with_agency_mut(agency_id, |agency| {
            agency.owner_id = Some(owner_id.to_string());
        })
    }

    async fn set_deleted(&self, agency_id: &str, deleted_at: Option<DateTime<Utc>>) -> Result<()> {
        self.with_agency_mut(agency_id, |agency| agency.deleted_at = deleted_at)
    }

    async fn facet_rows(&self, country: Option<&Country>) -> Result<Vec<FacetRow>> {
        Ok(self
            .read()?
            .agencies
            .iter()
            .filter(|a| a.is_visible())
            .filter(|a| country.is_none_or(|c| country_matches(a, c)))
            .map(|a| FacetRow {
                city_normalized: a.city_normalized.clone(),
                country_code: a.country_code.clone(),
                country_normalized: a.country_normalized.clone(),
                category_normalized: a.category_normalized.clone(),
            })
            .collect())
    }

    async fn most_reviewed(&self, limit: u32) -> Result<Vec<Agency>> {
        let tables = self.read()?;
        let mut visible: Vec<&Agency> = tables.agencies.iter().filter(|a| a.is_visible()).collect();
        visible.sort_by(|a, b| {
            b.reviews_count
                .unwrap_or(0)
                .cmp(&a.reviews_count.unwrap_or(0))
                .then_with(|| b.score().total_cmp(&a.score()))
        });
        Ok(visible.into_iter().take(limit as usize).cloned().collect())
    }

    async fn list_public_agencies(&self) -> Result<Vec<Agency>> {
        Ok(self
            .read()?
            .agencies
            .iter()
            .filter(|a| a.is_visible())
            .cloned()
            .collect())
    }

    async fn services_for(&self, agency_id: &str) -> Result<Vec<Service>> {
        Ok(self
            .read()?
            .services
            .iter()
            .filter(|s| s.agency_id == agency_id)
            .cloned()
            .collect())
    }

    async fn experiences_for(&self, agency_id: &str) -> Result<Vec<Experience>> {
        Ok(self
            .read()?
            .experiences
            .iter()
            .filter(|e| e.agency_id == agency_id)
            .cloned()
            .collect())
    }

    async fn service_by_id(&self, id: &str) -> Result<Option<Service>> {
        Ok(self.read()?.services.iter().find(|s| s.id == id).cloned())
    }

    async fn experience_by_id(&self, id: &str) -> Result<Option<Experience>> {
        Ok(self.read()?.experiences.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_service(&self, service: &Service) -> Result<Service> {
        let mut stored = service.clone();
        stored.id = new_id(&stored.id);
        self.write()?.services.push(stored.clone());
        Ok(stored)
    }

    async fn insert_experience(&self, experience: &Experience) -> Result<Experience> {
        let mut stored = experience.clone();
        stored.id = new_id(&stored.id);
        self.write()?.experiences.push(stored.clone());
        Ok(stored)
    }

    async fn delete_service(&self, id: &str) -> Result<()> {
        self.write()?.services.retain(|s| s.id != id);
        Ok(())
    }

    async fn delete_experience(&self, id: &str) -> Result<()> {
        self.write()?.experiences.retain(|e| e.id != id);
        Ok(())
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> Result<AccessRequest> {
        let mut tables = self.write()?;
        let duplicate = tables
            .access_requests
            .iter()
            .any(|r| r.agency_id == request.agency_id && r.user_id == request.user_id);
        if duplicate {
            return Err(DirectoryError::conflict(
                "You have already requested access to this agency.",
            ));
        }

        let mut stored = request.clone();
        stored.id = new_id(&stored.id);
        stored.created_at.get_or_insert_with(Utc::now);
        tables.access_requests.push(stored.clone());
        Ok(stored)
    }

    async fn access_request_by_id(&self, id: &str) -> Result<Option<AccessRequest>> {
        Ok(self
            .read()?
            .access_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list_access_requests(&self, status: Option<ReviewStatus>) -> Result<Vec<AccessRequest>> {
        let tables = self.read()?;
        let mut requests: Vec<AccessRequest> = tables
            .access_requests
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn update_access_request_status(
        &self,
        id: &str,
        status: ReviewStatus,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut tables = self.write()?;
        let request = tables
            .access_requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DirectoryError::not_found("Request not found"))?;
        request.status = status;
        request.reviewed_at = Some(reviewed_at);
        Ok(())
    }

    async fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        Ok(self.read()?.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<String>> {
        Ok(self
            .read()?
            .profiles
            .iter()
            .find(|p| p.id == token)
            .map(|p| p.id.clone()))
    }
}
