//! Hosted data service store (PostgREST table API + auth user endpoint)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::filter::{POSTGREST_ORDER, ResolvedFilter, sanitize_filter_value};
use super::store::{AgencyUpdate, DirectoryStore, FacetRow};
use super::AgencyPage;
use crate::config::DataConfig;
use crate::geo::Country;
use crate::models::{AccessRequest, Agency, Experience, Profile, ReviewStatus, Service};
use crate::{DirectoryError, Result};

const AGENCIES: &str = "agencies";
const SERVICES: &str = "services";
const EXPERIENCES: &str = "experiences";
const ACCESS_REQUESTS: &str = "agency_access_requests";
const PROFILES: &str = "profiles";

/// Postgres unique violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

pub struct PostgrestStore {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    service_key: String,
}

type Params = Vec<(&'static str, String)>;

fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn eq(value: &str) -> String {
    format!("eq.{}", sanitize_filter_value(value))
}

/// Total from `Content-Range: 0-23/1234` (or `*/0` for no rows)
fn parse_content_range(header: Option<&str>) -> Option<u64> {
    header?.rsplit('/').next()?.parse().ok()
}

impl PostgrestStore {
    pub fn new(config: &DataConfig, client: ClientWithMiddleware) -> Result<Self> {
        let base_url = config
            .url
            .clone()
            .ok_or_else(|| DirectoryError::config("data.url is not set"))?;
        let service_key = config
            .service_key
            .clone()
            .or_else(|| config.anon_key.clone())
            .ok_or_else(|| DirectoryError::config("No data service key configured"))?;
        let api_key = config.anon_key.clone().unwrap_or_else(|| service_key.clone());

        if config.service_key.is_none() {
            warn!("Using the anon key for server-side writes; row level security may reject them");
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            service_key,
        })
    }

    fn request(&self, method: Method, table: &str, params: &[(&str, String)]) -> RequestBuilder {
        let mut url = format!("{}/rest/v1/{table}", self.base_url);
        if !params.is_empty() {
            url.push('?');
            url.push_str(&encode_query(params));
        }
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn send(&self, builder: RequestBuilder, table: &str) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| DirectoryError::storage(format!("{table}: request failed: {e}")))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<PostgrestError> = serde_json::from_str(&body).ok();
        let code = parsed.as_ref().and_then(|e| e.code.as_deref());

        if status == StatusCode::CONFLICT || code == Some(UNIQUE_VIOLATION) {
            let message = parsed
                .as_ref()
                .and_then(|e| e.message.clone())
                .unwrap_or_else(|| "duplicate record".to_string());
            return Err(DirectoryError::conflict(message));
        }

        Err(DirectoryError::storage(format!("{table}: {status}: {body}")))
    }

    async fn json<T: DeserializeOwned>(response: reqwest::Response, table: &str) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| DirectoryError::storage(format!("{table}: invalid response: {e}")))
    }

    #[instrument(level = "debug", skip(self, params))]
    async fn select<T: DeserializeOwned>(&self, table: &'static str, params: Params) -> Result<Vec<T>> {
        let response = self.send(self.request(Method::GET, table, &params), table).await?;
        Self::json(response, table).await
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &'static str, mut params: Params) -> Result<Option<T>> {
        params.push(("limit", "1".to_string()));
        Ok(self.select(table, params).await?.into_iter().next())
    }

    async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(&self, table: &'static str, rows: &B) -> Result<Vec<T>> {
        let body = serde_json::to_vec(rows)
            .map_err(|e| DirectoryError::storage(format!("{table}: {e}")))?;
        let builder = self
            .request(Method::POST, table, &[])
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .body(body);
        let response = self.send(builder, table).await?;
        Self::json(response, table).await
    }

    async fn patch<B: Serialize + ?Sized>(&self, table: &'static str, id: &str, body: &B) -> Result<()> {
        let body = serde_json::to_vec(body)
            .map_err(|e| DirectoryError::storage(format!("{table}: {e}")))?;
        let builder = self
            .request(Method::PATCH, table, &[("id", eq(id))])
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .body(body);
        self.send(builder, table).await?;
        Ok(())
    }

    async fn delete(&self, table: &'static str, id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, table, &[("id", eq(id))]), table)
            .await?;
        Ok(())
    }

    fn visible() -> Params {
        vec![
            ("status", "eq.approved".to_string()),
            ("deleted_at", "is.null".to_string()),
        ]
    }
}

#[async_trait]
impl DirectoryStore for PostgrestStore {
    #[instrument(skip(self, filter))]
    async fn search_agencies(&self, filter: &ResolvedFilter) -> Result<AgencyPage> {
        let mut params: Params = filter.postgrest_filters();
        params.push(("select", "*".to_string()));
        params.push(("order", POSTGREST_ORDER.to_string()));
        params.push(("offset", filter.offset.to_string()));
        params.push(("limit", filter.limit.to_string()));

        let builder = self
            .request(Method::GET, AGENCIES, &params)
            .header("Prefer", "count=exact");
        let response = self.send(builder, AGENCIES).await?;
        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let agencies: Vec<Agency> = Self::json(response, AGENCIES).await?;
        let total = parse_content_range(content_range.as_deref()).unwrap_or(agencies.len() as u64);
        debug!("Agency search matched {total} rows");

        Ok(AgencyPage { agencies, total })
    }

    async fn agency_by_slug(&self, slug: &str) -> Result<Option<Agency>> {
        self.select_one(AGENCIES, vec![("slug", eq(slug))]).await
    }

    async fn agency_by_id(&self, id: &str) -> Result<Option<Agency>> {
        self.select_one(AGENCIES, vec![("id", eq(id))]).await
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        #[derive(Deserialize)]
        struct SlugRow {
            #[allow(dead_code)]
            slug: String,
        }
        let row: Option<SlugRow> = self
            .select_one(
                AGENCIES,
                vec![("select", "slug".to_string()), ("slug", eq(slug))],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn insert_agencies(&self, agencies: &[Agency]) -> Result<Vec<Agency>> {
        self.insert(AGENCIES, agencies).await
    }

    async fn update_agency(&self, id: &str, update: &AgencyUpdate) -> Result<()> {
        self.patch(AGENCIES, id, update).await
    }

    async fn assign_owner(&self, agency_id: &str, owner_id: &str) -> Result<()> {
        self.patch(AGENCIES, agency_id, &json!({ "owner_id": owner_id }))
            .await
    }

    async fn set_deleted(&self, agency_id: &str, deleted_at: Option<DateTime<Utc>>) -> Result<()> {
        self.patch(AGENCIES, agency_id, &json!({ "deleted_at": deleted_at }))
            .await
    }

    async fn facet_rows(&self, country: Option<&Country>) -> Result<Vec<FacetRow>> {
        let mut params = Self::visible();
        params.push((
            "select",
            "city_normalized,country_code,country_normalized,category_normalized".to_string(),
        ));
        if let Some(country) = country {
            let code = sanitize_filter_value(&country.code);
            let name = sanitize_filter_value(&country.name);
            params.push((
                "or",
                format!(
                    "(country_code.ilike.\"{code}\",country_code.ilike.\"{name}\",country_normalized.ilike.\"{code}\",country_normalized.ilike.\"{name}\")"
                ),
            ));
        }
        self.select(AGENCIES, params).await
    }

    async fn most_reviewed(&self, limit: u32) -> Result<Vec<Agency>> {
        let mut params = Self::visible();
        params.push((
            "order",
            "reviews_count.desc.nullslast,total_score.desc.nullslast".to_string(),
        ));
        params.push(("limit", limit.to_string()));
        self.select(AGENCIES, params).await
    }

    async fn list_public_agencies(&self) -> Result<Vec<Agency>> {
        let mut params = Self::visible();
        params.push(("order", "created_at.asc".to_string()));
        self.select(AGENCIES, params).await
    }

    async fn services_for(&self, agency_id: &str) -> Result<Vec<Service>> {
        self.select(SERVICES, vec![("agency_id", eq(agency_id))]).await
    }

    async fn experiences_for(&self, agency_id: &str) -> Result<Vec<Experience>> {
        self.select(EXPERIENCES, vec![("agency_id", eq(agency_id))])
            .await
    }

    async fn service_by_id(&self, id: &str) -> Result<Option<Service>> {
        self.select_one(SERVICES, vec![("id", eq(id))]).await
    }

    async fn experience_by_id(&self, id: &str) -> Result<Option<Experience>> {
        self.select_one(EXPERIENCES, vec![("id", eq(id))]).await
    }

    async fn insert_service(&self, service: &Service) -> Result<Service> {
        let rows: Vec<Service> = self.insert(SERVICES, &[service]).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DirectoryError::storage("services: insert returned no row"))
    }

    async fn insert_experience(&self, experience: &Experience) -> Result<Experience> {
        let rows: Vec<Experience> = self.insert(EXPERIENCES, &[experience]).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DirectoryError::storage("experiences: insert returned no row"))
    }

    async fn delete_service(&self, id: &str) -> Result<()> {
        self.delete(SERVICES, id).await
    }

    async fn delete_experience(&self, id: &str) -> Result<()> {
        self.delete(EXPERIENCES, id).await
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> Result<AccessRequest> {
        let rows: Vec<AccessRequest> = match self.insert(ACCESS_REQUESTS, &[request]).await {
            Err(DirectoryError::Conflict { .. }) => {
                return Err(DirectoryError::conflict(
                    "You have already requested access to this agency.",
                ));
            }
            other => other?,
        };
        rows.into_iter()
            .next()
            .ok_or_else(|| DirectoryError::storage("agency_access_requests: insert returned no row"))
    }

    async fn access_request_by_id(&self, id: &str) -> Result<Option<AccessRequest>> {
        self.select_one(ACCESS_REQUESTS, vec![("id", eq(id))]).await
    }

    async fn list_access_requests(&self, status: Option<ReviewStatus>) -> Result<Vec<AccessRequest>> {
        let mut params: Params = vec![("order", "created_at.desc".to_string())];
        if let Some(status) = status {
            params.push(("status", eq(status.as_str())));
        }
        self.select(ACCESS_REQUESTS, params).await
    }

    async fn update_access_request_status(
        &self,
        id: &str,
        status: ReviewStatus,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        self.patch(
            ACCESS_REQUESTS,
            id,
            &json!({ "status": status, "reviewed_at": reviewed_at }),
        )
        .await
    }

    async fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.select_one(PROFILES, vec![("id", eq(user_id))]).await
    }

    #[instrument(level = "debug", skip_all)]
    async fn resolve_session(&self, token: &str) -> Result<Option<String>> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| DirectoryError::storage(format!("auth: request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = Self::json(response, "auth").await?;
                Ok(Some(user.id))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(DirectoryError::storage(format!("auth: unexpected status {status}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range() {
        assert_eq!(parse_content_range(Some("0-23/1234")), Some(1234));
        assert_eq!(parse_content_range(Some("*/0")), Some(0));
        assert_eq!(parse_content_range(Some("0-23/*")), None);
        assert_eq!(parse_content_range(None), None);
    }

    #[test]
    fn test_encode_query() {
        let query = encode_query(&[
            ("status", "eq.approved".to_string()),
            ("or", "(title.ilike.*new york*)".to_string()),
        ]);
        assert_eq!(
            query,
            "status=eq.approved&or=%28title.ilike.%2Anew%20york%2A%29"
        );
    }

    #[test]
    fn test_new_requires_url_and_key() {
        let client = crate::http::build_client(&crate::config::HttpConfig::default()).unwrap();
        let mut config = DataConfig::default();
        assert!(PostgrestStore::new(&config, client.clone()).is_err());

        config.url = Some("https://project.supabase.co/".to_string());
        assert!(PostgrestStore::new(&config, client.clone()).is_err());

        config.anon_key = Some("anon".to_string());
        let store = PostgrestStore::new(&config, client).unwrap();
        assert_eq!(store.base_url, "https://project.supabase.co");
    }
}
