//! Trip itinerary model
//!
//! Itineraries are generated per planner request and never persisted. The
//! aggregate `total_price` equals the sum of every day's transport price and
//! accommodation price; overlays keep that true by applying price deltas.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Flight,
    Train,
    Bus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TripTag {
    Recommended,
    Cheapest,
    Fastest,
    Luxury,
    Nature,
    Urban,
    Relaxation,
}

/// Leg that brings the traveler into a day's city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transport {
    #[serde(rename = "type")]
    pub kind: TransportKind,
    pub from: String,
    pub to: String,
    /// Human readable, e.g. `2h 35m`
    pub duration: String,
    pub price: i64,
    pub booking_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default)]
    pub is_real_data: bool,
}

/// Live values for a transport leg
#[derive(Debug, Clone, PartialEq)]
pub struct TransportOverlay {
    pub price: i64,
    pub duration: String,
    pub provider: String,
    pub booking_link: String,
}

impl Transport {
    /// A copy with the overlay's values; route and kind are kept.
    #[must_use]
    pub fn overlaid(&self, overlay: &TransportOverlay) -> Transport {
        Transport {
            kind: self.kind,
            from: self.from.clone(),
            to: self.to.clone(),
            duration: overlay.duration.clone(),
            price: overlay.price,
            booking_link: overlay.booking_link.clone(),
            provider: Some(overlay.provider.clone()),
            is_real_data: true,
        }
    }
}

/// Nightly lodging for one day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Accommodation {
    pub name: String,
    /// Nightly price per room
    pub price: i64,
    pub rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub booking_link: String,
    #[serde(default)]
    pub is_real_data: bool,
}

/// Live values for an accommodation entry
#[derive(Debug, Clone, PartialEq)]
pub struct AccommodationOverlay {
    pub name: String,
    pub price: i64,
    pub rating: f64,
    pub image: Option<String>,
    pub booking_link: String,
}

impl Accommodation {
    /// A copy with the overlay's values; the image falls back to the current one.
    #[must_use]
    pub fn overlaid(&self, overlay: &AccommodationOverlay) -> Accommodation {
        Accommodation {
            name: overlay.name.clone(),
            price: overlay.price,
            rating: overlay.rating,
            image: overlay.image.clone().or_else(|| self.image.clone()),
            booking_link: overlay.booking_link.clone(),
            is_real_data: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripDay {
    pub date: NaiveDate,
    pub city: String,
    pub activities: Vec<String>,
    pub accommodation: Accommodation,
    pub transport: Option<Transport>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripItinerary {
    pub id: String,
    pub name: String,
    pub total_price: i64,
    pub duration_days: u32,
    pub travelers: u32,
    pub days: Vec<TripDay>,
    pub tags: Vec<TripTag>,
    pub image: String,
    pub video: String,
}

impl TripItinerary {
    #[must_use]
    pub fn has_tag(&self, tag: TripTag) -> bool {
        self.tags.contains(&tag)
    }

    /// Sum of day-level transport and accommodation prices
    #[must_use]
    pub fn computed_total(&self) -> i64 {
        self.days
            .iter()
            .map(|day| day.accommodation.price + day.transport.as_ref().map_or(0, |t| t.price))
            .sum()
    }

    /// Number of consecutive days from the start spent in the first city
    #[must_use]
    pub fn first_city_block_len(&self) -> usize {
        let Some(first) = self.days.first() else {
            return 0;
        };
        self.days
            .iter()
            .take_while(|day| day.city == first.city)
            .count()
    }
}

/// Planner search form
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlannerInputs {
    #[serde(default)]
    pub start_location: Option<String>,
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub destination_query: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default = "default_travelers")]
    pub travelers: u32,
    #[serde(default)]
    pub interests: Vec<String>,
}

fn default_travelers() -> u32 {
    1
}

impl PlannerInputs {
    /// No destination given at all: the planner picks cities itself
    #[must_use]
    pub fn is_anywhere_search(&self) -> bool {
        self.destinations.iter().all(|d| d.trim().is_empty())
            && self
                .destination_query
                .as_deref()
                .is_none_or(|q| q.trim().is_empty())
    }
}
