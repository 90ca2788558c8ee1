use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, MaybeCaller, SignedIn};
use crate::directory::{
    AccessRequestInput, AgencyFilter, AgencyUpdate, Facets, NewAgency, NewExperience, NewService,
};
use crate::geo::country_name;
use crate::models::{AccessRequest, Agency, Experience, GeoPoint, ReviewStatus, Service};
use crate::DirectoryError;

const DEFAULT_FEATURED: u32 = 6;
const DEFAULT_NEARBY: usize = 10;
const MAX_LIST: u32 = 50;

/// Agency as the frontend renders it
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiAgency {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub maps_url: Option<String>,
    pub rating: Option<f64>,
    pub reviews_count: Option<i64>,
    pub featured: bool,
    pub verified: bool,
    pub status: ReviewStatus,
    pub location: Option<GeoPoint>,
}

impl ApiAgency {
    pub fn new(agency: &Agency, location: Option<GeoPoint>) -> Self {
        Self {
            id: agency.id.clone(),
            slug: agency.slug.clone(),
            title: agency.title.clone(),
            description: agency.description.clone(),
            category: agency.category_name.clone(),
            street: agency.street.clone(),
            city: agency.city.clone(),
            state: agency.state.clone(),
            country_code: agency.country_code.clone(),
            country: agency.country_code.as_deref().map(country_name),
            phone: agency.phone.clone(),
            website: agency.website.clone(),
            email: agency.email.clone(),
            image_url: agency.image_url.clone(),
            maps_url: agency.url.clone(),
            rating: agency.total_score,
            reviews_count: agency.reviews_count,
            featured: agency.featured,
            verified: agency.verified,
            status: agency.status,
            location,
        }
    }
}

#[derive(Serialize)]
pub struct ApiAgencyPage {
    agencies: Vec<ApiAgency>,
    total: u64,
    page: u32,
    limit: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    agency: ApiAgency,
    services: Vec<Service>,
    experiences: Vec<Experience>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNearby {
    agency: ApiAgency,
    distance_km: f64,
}

#[derive(Deserialize)]
struct FacetsQuery {
    country: Option<String>,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<u32>,
}

#[derive(Deserialize)]
struct NearbyQuery {
    lat: f64,
    lng: f64,
    limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/agencies", get(search).post(submit))
        .route("/agencies/facets", get(facets))
        .route("/agencies/featured", get(featured))
        .route("/agencies/nearby", get(nearby))
        .route("/agencies/markers", get(markers))
        .route("/agencies/{agency}", get(profile).patch(update))
        .route("/agencies/{agency}/services", post(add_service))
        .route("/agencies/{agency}/experiences", post(add_experience))
        .route("/agencies/{agency}/access-requests", post(request_access))
}

async fn search(State(state): State<AppState>, Query(filter): Query<AgencyFilter>) -> Json<ApiAgencyPage> {
    let resolved = filter.resolve();
    let page = state.directory.search_agencies(&filter).await;
    let resolver = state.directory.resolver();

    Json(ApiAgencyPage {
        agencies: page
            .agencies
            .iter()
            .map(|a| ApiAgency::new(a, resolver.resolve(a)))
            .collect(),
        total: page.total,
        page: filter.page.unwrap_or(1).max(1),
        limit: resolved.limit,
    })
}

async fn facets(State(state): State<AppState>, Query(query): Query<FacetsQuery>) -> Result<Json<Facets>, ApiError> {
    Ok(Json(state.directory.facets(query.country.as_deref()).await?))
}

async fn featured(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ApiAgency>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_FEATURED).clamp(1, MAX_LIST);
    let resolver = state.directory.resolver();
    let agencies = state.directory.featured_agencies(limit).await?;
    Ok(Json(
        agencies.iter().map(|a| ApiAgency::new(a, resolver.resolve(a))).collect(),
    ))
}

async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<ApiNearby>>, ApiError> {
    let center = GeoPoint::checked(query.lat, query.lng)
        .ok_or_else(|| DirectoryError::validation("Coordinates out of range"))?;
    let limit = query
        .limit
        .map_or(DEFAULT_NEARBY, |l| l.clamp(1, MAX_LIST) as usize);

    let found = state.directory.nearby_agencies(center, limit).await?;
    Ok(Json(
        found
            .iter()
            .map(|n| ApiNearby {
                agency: ApiAgency::new(&n.agency, Some(n.location)),
                distance_km: n.distance_km,
            })
            .collect(),
    ))
}

async fn markers(State(state): State<AppState>) -> Result<Json<Vec<ApiAgency>>, ApiError> {
    let markers = state.directory.map_markers().await?;
    Ok(Json(
        markers
            .iter()
            .map(|(agency, point)| ApiAgency::new(agency, Some(*point)))
            .collect(),
    ))
}

async fn profile(
    State(state): State<AppState>,
    MaybeCaller(caller): MaybeCaller,
    Path(slug): Path<String>,
) -> Result<Json<ApiProfile>, ApiError> {
    let profile = state.directory.agency_profile(&slug, caller.as_ref()).await?;
    Ok(Json(ApiProfile {
        agency: ApiAgency::new(&profile.agency, profile.location),
        services: profile.services,
        experiences: profile.experiences,
    }))
}

async fn submit(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Json(input): Json<NewAgency>,
) -> Result<(StatusCode, Json<ApiAgency>), ApiError> {
    let agency = state.directory.submit_agency(&caller, input).await?;
    let location = state.directory.resolver().resolve(&agency);
    Ok((StatusCode::CREATED, Json(ApiAgency::new(&agency, location))))
}

async fn update(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Path(id): Path<String>,
    Json(update): Json<AgencyUpdate>,
) -> Result<Json<ApiAgency>, ApiError> {
    let agency = state.directory.update_agency(&caller, &id, update).await?;
    let location = state.directory.resolver().resolve(&agency);
    Ok(Json(ApiAgency::new(&agency, location)))
}

async fn add_service(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Path(id): Path<String>,
    Json(input): Json<NewService>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let service = state.directory.add_service(&caller, &id, input).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn add_experience(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Path(id): Path<String>,
    Json(input): Json<NewExperience>,
) -> Result<(StatusCode, Json<Experience>), ApiError> {
    let experience = state.directory.add_experience(&caller, &id, input).await?;
    Ok((StatusCode::CREATED, Json(experience)))
}

async fn request_access(
    State(state): State<AppState>,
    SignedIn(caller): SignedIn,
    Path(id): Path<String>,
    Json(input): Json<AccessRequestInput>,
) -> Result<(StatusCode, Json<AccessRequest>), ApiError> {
    let request = state.directory.request_access(&caller, &id, input).await?;
    Ok((StatusCode::CREATED, Json(request)))
}
