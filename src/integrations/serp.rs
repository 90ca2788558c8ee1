//! Flight and hotel search through SerpApi's Google Flights / Google Hotels engines

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::error::{IntegrationError, Result};
use crate::config::SerpConfig;
use crate::planner::{FlightOffer, FlightSearch, HotelOffer, HotelSearch};

const SERVICE: &str = "SerpApi";
const MAX_HOTELS: usize = 3;
const DEFAULT_HOTEL_RATING: f64 = 4.5;
const DEFAULT_FLIGHT_MINUTES: u32 = 120;

/// IATA city or airport codes for common hubs
const AIRPORT_CODES: &[(&str, &str)] = &[
    ("Paris", "PAR"),
    ("London", "LON"),
    ("New York", "NYC"),
    ("Tokyo", "TYO"),
    ("Dubai", "DXB"),
    ("Istanbul", "IST"),
    ("Bangkok", "BKK"),
    ("Singapore", "SIN"),
    ("Barcelona", "BCN"),
    ("Madrid", "MAD"),
    ("Rome", "ROM"),
    ("Milan", "MIL"),
    ("Amsterdam", "AMS"),
    ("Lisbon", "LIS"),
    ("Prague", "PRG"),
    ("Berlin", "BER"),
    ("Sydney", "SYD"),
    ("Los Angeles", "LAX"),
    ("San Francisco", "SFO"),
    ("Miami", "MIA"),
    ("Bali", "DPS"),
    ("Marrakech", "RAK"),
    ("Cairo", "CAI"),
    ("Lyon", "LYS"),
    ("Marseille", "MRS"),
    ("Nice", "NCE"),
    ("Toulouse", "TLS"),
    ("Bordeaux", "BOD"),
    ("Nantes", "NTE"),
    ("Lille", "LIL"),
    ("Montpellier", "MPL"),
    ("Strasbourg", "SXB"),
    ("Casablanca", "CMN"),
    ("Tunis", "TUN"),
    ("Algiers", "ALG"),
];

/// Airport code for a free-text city: first table entry contained in the
/// name, else the first three letters upper-cased.
#[must_use]
pub fn airport_code(city: &str) -> String {
    let lower = city.to_lowercase();
    AIRPORT_CODES
        .iter()
        .find(|(name, _)| lower.contains(&name.to_lowercase()))
        .map_or_else(
            || city.trim().chars().take(3).collect::<String>().to_uppercase(),
            |(_, code)| (*code).to_string(),
        )
}

/// Price from a number or a formatted string such as `"$1,234"`
#[must_use]
pub fn parse_price(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect::<String>()
            .parse()
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

#[derive(Debug, Deserialize)]
struct Airport {
    time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlightSegment {
    airline: Option<String>,
    airline_logo: Option<String>,
    departure_airport: Option<Airport>,
    arrival_airport: Option<Airport>,
}

#[derive(Debug, Deserialize)]
struct FlightGroup {
    #[serde(default)]
    price: Value,
    total_duration: Option<u32>,
    #[serde(default)]
    flights: Vec<FlightSegment>,
    airline: Option<String>,
    airline_logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchMetadata {
    google_flights_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FlightsResponse {
    #[serde(default)]
    best_flights: Vec<FlightGroup>,
    #[serde(default)]
    other_flights: Vec<FlightGroup>,
    search_metadata: Option<SearchMetadata>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rate {
    #[serde(default)]
    lowest: Value,
}

#[derive(Debug, Deserialize)]
struct PropertyImage {
    original_image: Option<String>,
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Property {
    name: String,
    rate_per_night: Option<Rate>,
    total_rate: Option<Rate>,
    overall_rating: Option<f64>,
    #[serde(default)]
    images: Vec<PropertyImage>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HotelsResponse {
    #[serde(default)]
    properties: Vec<Property>,
    error: Option<String>,
}

/// Cheapest offer across best and other flights
#[must_use]
pub fn cheapest_flight(response: FlightsResponse, from: &str, to: &str, date: NaiveDate) -> Option<FlightOffer> {
    let link = response
        .search_metadata
        .and_then(|m| m.google_flights_url)
        .unwrap_or_else(|| {
            format!(
                "https://www.google.com/travel/flights?q=Flights%20to%20{}%20from%20{}%20on%20{date}",
                urlencoding::encode(to),
                urlencoding::encode(from)
            )
        });

    let cheapest = response
        .best_flights
        .into_iter()
        .chain(response.other_flights)
        .min_by(|a, b| parse_price(&a.price).total_cmp(&parse_price(&b.price)))?;

    let first_segment = cheapest.flights.first();
    let airline = first_segment
        .and_then(|s| s.airline.clone())
        .or_else(|| cheapest.airline.clone())
        .unwrap_or_else(|| "Multi-Airline".to_string());
    let logo = first_segment
        .and_then(|s| s.airline_logo.clone())
        .or_else(|| cheapest.airline_logo.clone());
    let departure = first_segment
        .and_then(|s| s.departure_airport.as_ref())
        .and_then(|a| a.time.clone())
        .unwrap_or_else(|| format!("{date} 10:00"));
    let arrival = first_segment
        .and_then(|s| s.arrival_airport.as_ref())
        .and_then(|a| a.time.clone())
        .unwrap_or_else(|| format!("{date} 14:00"));

    Some(FlightOffer {
        price: parse_price(&cheapest.price),
        airline,
        logo,
        duration_minutes: cheapest.total_duration.unwrap_or(DEFAULT_FLIGHT_MINUTES),
        departure,
        arrival,
        stops: u32::try_from(cheapest.flights.len().saturating_sub(1)).unwrap_or(0),
        link,
    })
}

/// First few properties, normalized
#[must_use]
pub fn hotel_offers(response: HotelsResponse, city: &str) -> Vec<HotelOffer> {
    response
        .properties
        .into_iter()
        .take(MAX_HOTELS)
        .map(|p| {
            let price = p
                .rate_per_night
                .as_ref()
                .map(|r| parse_price(&r.lowest))
                .filter(|price| *price > 0.0)
                .or_else(|| p.total_rate.as_ref().map(|r| parse_price(&r.lowest)))
                .unwrap_or(0.0);
            let image = p
                .images
                .first()
                .and_then(|i| i.original_image.clone().or_else(|| i.thumbnail.clone()));
            HotelOffer {
                name: p.name,
                price,
                rating: p.overall_rating.unwrap_or(DEFAULT_HOTEL_RATING),
                image,
                link: p.link.unwrap_or_else(|| {
                    format!(
                        "https://www.google.com/travel/hotels?q={}",
                        urlencoding::encode(city)
                    )
                }),
            }
        })
        .collect()
}

pub struct SerpApiClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
}

impl SerpApiClient {
    #[must_use]
    pub fn new(config: &SerpConfig, client: ClientWithMiddleware) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| IntegrationError::NotConfigured(SERVICE.to_string()))?;

        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .chain(std::iter::once(format!("api_key={}", urlencoding::encode(api_key))))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}?{query}", self.base_url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::from_status(SERVICE, status, body));
        }

        response
            .json()
            .await
            .map_err(|e| IntegrationError::Parse(format!("Failed to parse {SERVICE} response: {e}")))
    }
}

#[async_trait]
impl FlightSearch for SerpApiClient {
    #[instrument(skip(self))]
    async fn search_flight(&self, from: &str, to: &str, date: NaiveDate) -> Result<Option<FlightOffer>> {
        let departure_id = airport_code(from);
        let arrival_id = airport_code(to);
        debug!("Searching flights {departure_id} -> {arrival_id} on {date}");

        let response: FlightsResponse = self
            .fetch(&[
                ("engine", "google_flights".to_string()),
                ("departure_id", departure_id),
                ("arrival_id", arrival_id),
                ("outbound_date", date.to_string()),
                ("currency", "USD".to_string()),
                ("hl", "en".to_string()),
                ("type", "2".to_string()),
            ])
            .await?;

        if let Some(error) = &response.error {
            warn!("{SERVICE} flight search returned no results: {error}");
        }

        let offer = cheapest_flight(response, from, to, date);
        if let Some(offer) = &offer {
            info!("Cheapest flight {from} -> {to}: {} via {}", offer.price, offer.airline);
        }
        Ok(offer)
    }
}

#[async_trait]
impl HotelSearch for SerpApiClient {
    #[instrument(skip(self))]
    async fn search_hotels(&self, city: &str, check_in: NaiveDate, check_out: NaiveDate) -> Result<Vec<HotelOffer>> {
        let response: HotelsResponse = self
            .fetch(&[
                ("engine", "google_hotels".to_string()),
                ("q", city.to_string()),
                ("check_in_date", check_in.to_string()),
                ("check_out_date", check_out.to_string()),
                ("currency", "USD".to_string()),
                ("adults", "2".to_string()),
            ])
            .await?;

        if let Some(error) = &response.error {
            warn!("{SERVICE} hotel search returned no results: {error}");
        }

        let offers = hotel_offers(response, city);
        info!("Found {} hotels in {city}", offers.len());
        Ok(offers)
    }
}
