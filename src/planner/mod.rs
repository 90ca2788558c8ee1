//! Trip planner: baseline itinerary generation and live-price enrichment

pub mod enrichment;
pub mod generator;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::DirectoryError;
use crate::integrations::error::Result;
use crate::models::PlannerInputs;

pub use enrichment::{enrich_itineraries, enrich_itinerary, format_duration};
pub use generator::{Variation, generate_itineraries, generate_variation};

/// Longest trip the planner will lay out
pub const MAX_TRIP_DAYS: u32 = 60;
pub const MAX_TRAVELERS: u32 = 20;

/// Cheapest flight found for a route and date, priced per ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub price: f64,
    pub airline: String,
    pub logo: Option<String>,
    pub duration_minutes: u32,
    pub departure: String,
    pub arrival: String,
    pub stops: u32,
    pub link: String,
}

/// A hotel with its nightly price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOffer {
    pub name: String,
    pub price: f64,
    pub rating: f64,
    pub image: Option<String>,
    pub link: String,
}

#[async_trait]
pub trait FlightSearch: Send + Sync {
    async fn search_flight(&self, from: &str, to: &str, date: NaiveDate) -> Result<Option<FlightOffer>>;
}

#[async_trait]
pub trait HotelSearch: Send + Sync {
    /// Offers in the provider's order
    async fn search_hotels(&self, city: &str, check_in: NaiveDate, check_out: NaiveDate) -> Result<Vec<HotelOffer>>;
}

/// Reject forms the generator cannot lay out
pub fn validate_inputs(inputs: &PlannerInputs) -> crate::Result<()> {
    if inputs.end_date < inputs.start_date {
        return Err(DirectoryError::validation("End date must not be before start date"));
    }
    if generator::trip_length(inputs.start_date, inputs.end_date) > MAX_TRIP_DAYS {
        return Err(DirectoryError::validation(format!(
            "Trips are limited to {MAX_TRIP_DAYS} days"
        )));
    }
    if inputs.travelers == 0 || inputs.travelers > MAX_TRAVELERS {
        return Err(DirectoryError::validation(format!(
            "Travelers must be between 1 and {MAX_TRAVELERS}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn inputs(start: u32, end: u32, travelers: u32) -> PlannerInputs {
        PlannerInputs {
            start_location: None,
            destinations: vec!["Tokyo".to_string()],
            destination_query: None,
            start_date: NaiveDate::from_ymd_opt(2025, 3, start).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, end).unwrap(),
            budget: None,
            travelers,
            interests: vec![],
        }
    }

    #[rstest]
    #[case(1, 7, 2, true)]
    #[case(1, 1, 1, true)]
    #[case(7, 1, 2, false)]
    #[case(1, 7, 0, false)]
    #[case(1, 7, 21, false)]
    fn test_validate_inputs(#[case] start: u32, #[case] end: u32, #[case] travelers: u32, #[case] ok: bool) {
        assert_eq!(validate_inputs(&inputs(start, end, travelers)).is_ok(), ok);
    }
}
