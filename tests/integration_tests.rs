//! End-to-end tests of the HTTP API over the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use travel_directory::api::AppState;
use travel_directory::chat::ChatSessionStore;
use travel_directory::config::{ChatConfig, ContactConfig, HttpConfig, NewsletterConfig};
use travel_directory::contacted::ContactedTracker;
use travel_directory::directory::{DirectoryService, InMemoryStore};
use travel_directory::http::build_client;
use travel_directory::integrations::error::Result as IntegrationResult;
use travel_directory::integrations::{ChatMessage, ChatModel, ContactRelay, IntegrationError, NewsletterClient};
use travel_directory::models::{Agency, Profile, ReviewStatus};
use travel_directory::planner::{FlightOffer, FlightSearch, HotelOffer, HotelSearch};
use travel_directory::{PersistentCache, web};

const USER: &str = "user-1";
const ADMIN: &str = "admin-1";

struct FixedFlights;

#[async_trait]
impl FlightSearch for FixedFlights {
    async fn search_flight(&self, from: &str, to: &str, date: NaiveDate) -> IntegrationResult<Option<FlightOffer>> {
        Ok(Some(FlightOffer {
            price: 420.0,
            airline: "Royal Air Maroc".to_string(),
            logo: None,
            duration_minutes: 215,
            departure: format!("{date} 09:10"),
            arrival: format!("{date} 12:45"),
            stops: 0,
            link: format!("https://flights.example/{from}-{to}"),
        }))
    }
}

struct FixedHotels;

#[async_trait]
impl HotelSearch for FixedHotels {
    async fn search_hotels(&self, city: &str, _check_in: NaiveDate, _check_out: NaiveDate) -> IntegrationResult<Vec<HotelOffer>> {
        Ok(vec![
            HotelOffer {
                name: format!("Riad {city}"),
                price: 95.0,
                rating: 4.6,
                image: None,
                link: "https://hotels.example/riad".to_string(),
            },
            HotelOffer {
                name: format!("Palace {city}"),
                price: 310.0,
                rating: 4.9,
                image: None,
                link: "https://hotels.example/palace".to_string(),
            },
        ])
    }
}

struct Parrot;

#[async_trait]
impl ChatModel for Parrot {
    async fn complete(&self, messages: &[ChatMessage]) -> IntegrationResult<Option<String>> {
        Ok(messages.last().map(|m| format!("You said: {}", m.content)))
    }
}

struct Offline;

#[async_trait]
impl ChatModel for Offline {
    async fn complete(&self, _messages: &[ChatMessage]) -> IntegrationResult<Option<String>> {
        Err(IntegrationError::NotConfigured("OpenAI".to_string()))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

fn agency(id: &str, slug: &str, title: &str, city: &str, status: ReviewStatus) -> Agency {
    Agency {
        id: id.to_string(),
        slug: slug.to_string(),
        title: title.to_string(),
        city: Some(city.to_string()),
        city_normalized: Some(city.to_lowercase()),
        country_code: Some("MA".to_string()),
        country_normalized: Some("morocco".to_string()),
        category_name: Some("Travel agency".to_string()),
        category_normalized: Some("travel agency".to_string()),
        total_score: Some(4.5),
        reviews_count: Some(40),
        status,
        ..Agency::default()
    }
}

fn temp_cache() -> PersistentCache {
    let dir = std::env::temp_dir().join(format!("travel-directory-it-{}", Uuid::new_v4()));
    PersistentCache::open(dir).unwrap()
}

fn test_app_with(chat_model: Arc<dyn ChatModel>) -> Router {
    let store = InMemoryStore::with_agencies(vec![
        agency("a-1", "atlas-voyages", "Atlas Voyages", "Marrakech", ReviewStatus::Approved),
        agency("a-2", "sahara-trips", "Sahara Trips", "Fes", ReviewStatus::Approved),
        agency("a-3", "pending-tours", "Pending Tours", "Rabat", ReviewStatus::Pending),
    ]);
    store
        .add_profile(Profile {
            id: USER.to_string(),
            email: Some("user@example.com".to_string()),
            full_name: Some("Sam Traveler".to_string()),
            is_admin: false,
        })
        .unwrap();
    store
        .add_profile(Profile {
            id: ADMIN.to_string(),
            email: Some("admin@example.com".to_string()),
            full_name: None,
            is_admin: true,
        })
        .unwrap();

    let client = build_client(&HttpConfig::default()).unwrap();
    let cache = temp_cache();
    let chat_config = ChatConfig {
        history_window: 10,
        session_ttl_minutes: 30,
        ..ChatConfig::default()
    };

    let state = AppState {
        directory: Arc::new(DirectoryService::new(Arc::new(store))),
        flights: Arc::new(FixedFlights),
        hotels: Arc::new(FixedHotels),
        writer: Arc::new(Offline),
        chat: ChatSessionStore::new(cache.clone(), chat_model, &chat_config),
        contacted: Arc::new(ContactedTracker::new(cache)),
        contact: ContactRelay::new(&ContactConfig::default(), client.clone()),
        newsletter: NewsletterClient::new(&NewsletterConfig::default(), client),
        public_base_url: "https://travelagencies.world".to_string(),
    };
    web::app(state, None)
}

fn test_app() -> Router {
    test_app_with(Arc::new(Parrot))
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_search_lists_only_visible_agencies() {
    let app = test_app();
    let (status, body) = call(&app, "GET", "/api/agencies?country=Morocco", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let slugs: Vec<&str> = body["agencies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["slug"].as_str().unwrap())
        .collect();
    assert!(slugs.contains(&"atlas-voyages"));
    assert!(!slugs.contains(&"pending-tours"));
}

#[tokio::test]
async fn test_profile_visibility() {
    let app = test_app();

    let (status, body) = call(&app, "GET", "/api/agencies/atlas-voyages", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["agency"]["title"], "Atlas Voyages");
    assert_eq!(body["agency"]["country"], "Morocco");
    assert!(body["agency"]["location"]["lat"].is_number());

    let (status, body) = call(&app, "GET", "/api/agencies/pending-tours", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Agency not found");

    let (status, _) = call(&app, "GET", "/api/agencies/pending-tours", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_submission_requires_sign_in() {
    let app = test_app();
    let payload = json!({ "title": "Blue Coast Travel", "city": "Agadir", "country_code": "ma" });

    let (status, body) = call(&app, "POST", "/api/agencies", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["login"], "/auth/login");

    let (status, body) = call(&app, "POST", "/api/agencies", Some(USER), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "blue-coast-travel");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["countryCode"], "MA");

    let (status, _) = call(&app, "GET", "/api/agencies/blue-coast-travel", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "GET", "/api/agencies/blue-coast-travel", Some(USER), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_claim_workflow() {
    let app = test_app();

    let (status, _) = call(
        &app,
        "PATCH",
        "/api/agencies/a-1",
        Some(USER),
        Some(json!({ "description": "Desert tours" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, request) = call(
        &app,
        "POST",
        "/api/agencies/a-1/access-requests",
        Some(USER),
        Some(json!({ "message": "I run this agency" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["user_email"], "user@example.com");
    let request_id = request["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        "POST",
        "/api/agencies/a-1/access-requests",
        Some(USER),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, "GET", "/api/admin/access-requests", Some(USER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, pending) = call(&app, "GET", "/api/admin/access-requests?status=pending", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, body) = call(
        &app,
        "POST",
        "/api/admin/access-requests/approve",
        Some(ADMIN),
        Some(json!({ "requestId": request_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = call(
        &app,
        "PATCH",
        "/api/agencies/a-1",
        Some(USER),
        Some(json!({ "description": "Desert tours" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Desert tours");

    let (status, _) = call(
        &app,
        "PATCH",
        "/api/agencies/a-1",
        Some(USER),
        Some(json!({ "featured": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_ignores_normalized_columns() {
    let app = test_app();
    let (status, _) = call(
        &app,
        "PATCH",
        "/api/agencies/a-1",
        Some(ADMIN),
        Some(json!({ "city_normalized": "paris", "category_normalized": "luxury spa" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&app, "GET", "/api/agencies?city=Marrakech", None, None).await;
    assert_eq!(body["total"], 1);
    let (_, body) = call(&app, "GET", "/api/agencies?city=Paris", None, None).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = test_app();
    let (status, _) = call(
        &app,
        "POST",
        "/api/contact",
        None,
        Some(json!({
            "name": "Sam",
            "email": "sam@example.com",
            "subject": "Hello",
            "message": "x".repeat(2 * 1024 * 1024),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_soft_delete_and_restore() {
    let app = test_app();

    let (status, _) = call(&app, "DELETE", "/api/admin/agencies?id=a-2", Some(USER), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "DELETE", "/api/admin/agencies?id=a-2", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", "/api/agencies/sahara-trips", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, "POST", "/api/admin/agencies/restore?id=a-2", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", "/api/agencies/sahara-trips", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_planner_overlays_live_prices() {
    let app = test_app();
    let form = json!({
        "startLocation": "Paris",
        "destinations": ["Marrakech"],
        "startDate": "2025-03-01",
        "endDate": "2025-03-04",
        "travelers": 1,
        "interests": ["culture"]
    });

    let (status, body) = call(&app, "POST", "/api/planner/itineraries", None, Some(form)).await;
    assert_eq!(status, StatusCode::OK);

    let itineraries = body.as_array().unwrap();
    assert_eq!(itineraries.len(), 3);
    for itinerary in itineraries {
        let first = &itinerary["days"][0];
        assert_eq!(first["transport"]["price"], 420);
        assert_eq!(first["transport"]["isRealData"], true);
        assert_eq!(first["transport"]["duration"], "3h 35m");
        assert_eq!(first["accommodation"]["isRealData"], true);

        let total: i64 = itinerary["days"]
            .as_array()
            .unwrap()
            .iter()
            .map(|day| {
                day["accommodation"]["price"].as_i64().unwrap()
                    + day["transport"]["price"].as_i64().unwrap_or(0)
            })
            .sum();
        assert_eq!(itinerary["totalPrice"].as_i64().unwrap(), total);
    }
}

#[tokio::test]
async fn test_planner_rejects_reversed_dates() {
    let app = test_app();
    let form = json!({
        "destinations": ["Tokyo"],
        "startDate": "2025-03-10",
        "endDate": "2025-03-01"
    });

    let (status, body) = call(&app, "POST", "/api/planner/itineraries", None, Some(form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "End date must not be before start date");
}

#[tokio::test]
async fn test_chat_session_lifecycle() {
    let app = test_app();

    let (status, opened) = call(
        &app,
        "POST",
        "/api/chat/sessions",
        None,
        Some(json!({ "agencySlug": "atlas-voyages" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = opened["sessionId"].as_str().unwrap().to_string();

    let uri = format!("/api/chat/sessions/{id}/messages");
    let (status, reply) = call(&app, "POST", &uri, None, Some(json!({ "message": "Hello" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["message"], "You said: Hello");

    let (status, _) = call(&app, "DELETE", &format!("/api/chat/sessions/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&app, "POST", &uri, None, Some(json!({ "message": "Still there?" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_without_model_credentials() {
    let app = test_app_with(Arc::new(Offline));
    let (_, opened) = call(&app, "POST", "/api/chat/sessions", None, Some(json!({}))).await;
    let id = opened["sessionId"].as_str().unwrap();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/chat/sessions/{id}/messages"),
        None,
        Some(json!({ "message": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Chat service is not configured.");
}

#[tokio::test]
async fn test_description_generator_checks() {
    let app = test_app();
    let payload = json!({ "title": "Atlas Voyages", "category": "Travel agency" });

    let (status, _) = call(
        &app,
        "POST",
        "/api/admin/agencies/generate-description",
        None,
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call(
        &app,
        "POST",
        "/api/admin/agencies/generate-description",
        Some(USER),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI service not configured");
}

#[tokio::test]
async fn test_contact_and_newsletter_validation() {
    let app = test_app();

    let (status, body) = call(&app, "POST", "/api/newsletter", None, Some(json!({ "email": "nobody" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email address");

    let (status, body) = call(&app, "POST", "/api/contact", None, Some(json!({ "name": "Sam" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Missing required fields"));

    let message = json!({
        "name": "Sam",
        "email": "sam@example.com",
        "subject": "Listing",
        "message": "How do I list my agency?"
    });
    let (status, _) = call(&app, "POST", "/api/contact", None, Some(message)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_contacted_tracker_is_admin_only() {
    let app = test_app();
    let mark = json!({ "id": "a-1", "contacted": true, "contactedBy": "Nadia" });

    let (status, _) = call(&app, "POST", "/api/contacted-agencies", Some(USER), Some(mark.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, "POST", "/api/contacted-agencies", Some(ADMIN), Some(mark)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["contactedBy"], "Nadia");

    let (status, body) = call(&app, "GET", "/api/contacted-agencies", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["a-1"]["contacted"], true);
}

#[tokio::test]
async fn test_sitemap_and_robots() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(Request::get("/sitemap.xml").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/xml")
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let xml = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(xml.contains("<urlset"));
    assert!(xml.contains("https://travelagencies.world/agencies/atlas-voyages"));
    assert!(xml.contains("https://travelagencies.world/fr/agencies/atlas-voyages"));
    assert!(!xml.contains("pending-tours"));

    let response = app
        .oneshot(Request::get("/robots.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let robots = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(robots.contains("Sitemap: https://travelagencies.world/sitemap.xml"));
}
