//! Overlay live flight and hotel offers onto generated itineraries

use chrono::Duration;
use futures::future::join_all;
use tracing::{debug, warn};

use super::{FlightOffer, FlightSearch, HotelOffer, HotelSearch};
use crate::models::{
    AccommodationOverlay, PlannerInputs, TransportKind, TransportOverlay, TripItinerary, TripTag,
};

/// `"{h}h {m}m"`
#[must_use]
pub fn format_duration(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[allow(clippy::cast_possible_truncation)]
fn round_price(price: f64) -> i64 {
    price.round() as i64
}

/// Leg price for all travelers; offers are per ticket
fn flight_overlay(offer: &FlightOffer, travelers: u32) -> TransportOverlay {
    TransportOverlay {
        price: round_price(offer.price * f64::from(travelers.max(1))),
        duration: format_duration(offer.duration_minutes),
        provider: offer.airline.clone(),
        booking_link: offer.link.clone(),
    }
}

fn hotel_overlay(offer: &HotelOffer) -> AccommodationOverlay {
    AccommodationOverlay {
        name: offer.name.clone(),
        price: round_price(offer.price),
        rating: offer.rating,
        image: offer.image.clone(),
        booking_link: offer.link.clone(),
    }
}

/// Offer index 1 for luxury trips when available, else the first one
fn pick_hotel<'a>(offers: &'a [HotelOffer], itinerary: &TripItinerary) -> Option<&'a HotelOffer> {
    if itinerary.has_tag(TripTag::Luxury) && offers.len() > 1 {
        offers.get(1)
    } else {
        offers.first()
    }
}

async fn apply_flight(itinerary: &mut TripItinerary, travelers: u32, flights: &dyn FlightSearch) {
    let Some(leg) = itinerary
        .days
        .first()
        .and_then(|day| day.transport.as_ref())
        .filter(|leg| leg.kind == TransportKind::Flight)
    else {
        return;
    };
    let date = itinerary.days[0].date;

    match flights.search_flight(&leg.from, &leg.to, date).await {
        Ok(Some(offer)) => {
            let updated = leg.overlaid(&flight_overlay(&offer, travelers));
            itinerary.total_price += updated.price - leg.price;
            debug!(
                "Flight {} -> {} priced {} (was {})",
                updated.from, updated.to, updated.price, leg.price
            );
            itinerary.days[0].transport = Some(updated);
        }
        Ok(None) => debug!("No flight offer for {} -> {}", leg.from, leg.to),
        Err(e) => warn!("Failed to enrich flight {} -> {}: {e}", leg.from, leg.to),
    }
}

async fn apply_hotel(itinerary: &mut TripItinerary, hotels: &dyn HotelSearch) {
    let block = itinerary.first_city_block_len();
    let Some(first) = itinerary.days.first() else {
        return;
    };
    let city = first.city.clone();
    let check_in = first.date;
    let check_out = check_in + Duration::days(i64::try_from(block).unwrap_or(1));

    let offers = match hotels.search_hotels(&city, check_in, check_out).await {
        Ok(offers) => offers,
        Err(e) => {
            warn!("Failed to enrich hotels in {city}: {e}");
            return;
        }
    };
    let Some(offer) = pick_hotel(&offers, itinerary) else {
        debug!("No hotel offers in {city}");
        return;
    };

    let overlay = hotel_overlay(offer);
    let mut delta = 0;
    for day in itinerary.days.iter_mut().take(block) {
        let updated = day.accommodation.overlaid(&overlay);
        delta += updated.price - day.accommodation.price;
        day.accommodation = updated;
    }
    itinerary.total_price += delta;
}

/// Enrich one itinerary; the baseline is left untouched
pub async fn enrich_itinerary(
    baseline: &TripItinerary,
    inputs: &PlannerInputs,
    flights: &dyn FlightSearch,
    hotels: &dyn HotelSearch,
) -> TripItinerary {
    let mut itinerary = baseline.clone();
    if itinerary.days.is_empty() {
        return itinerary;
    }
    apply_flight(&mut itinerary, inputs.travelers, flights).await;
    apply_hotel(&mut itinerary, hotels).await;
    itinerary
}

/// Enrich every itinerary concurrently. Output order matches the input.
pub async fn enrich_itineraries(
    baselines: &[TripItinerary],
    inputs: &PlannerInputs,
    flights: &dyn FlightSearch,
    hotels: &dyn HotelSearch,
) -> Vec<TripItinerary> {
    join_all(
        baselines
            .iter()
            .map(|baseline| enrich_itinerary(baseline, inputs, flights, hotels)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::IntegrationError;
    use crate::models::{Accommodation, Transport, TripDay};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct FakeFlights {
        result: fn() -> Result<Option<FlightOffer>, IntegrationError>,
    }

    #[async_trait]
    impl FlightSearch for FakeFlights {
        async fn search_flight(
            &self,
            _from: &str,
            _to: &str,
            _date: NaiveDate,
        ) -> Result<Option<FlightOffer>, IntegrationError> {
            (self.result)()
        }
    }

    struct FakeHotels {
        offers: Result<Vec<HotelOffer>, ()>,
        calls: Mutex<Vec<(String, NaiveDate, NaiveDate)>>,
    }

    impl FakeHotels {
        fn with(offers: Vec<HotelOffer>) -> Self {
            Self { offers: Ok(offers), calls: Mutex::new(Vec::new()) }
        }

        fn failing() -> Self {
            Self { offers: Err(()), calls: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl HotelSearch for FakeHotels {
        async fn search_hotels(
            &self,
            city: &str,
            check_in: NaiveDate,
            check_out: NaiveDate,
        ) -> Result<Vec<HotelOffer>, IntegrationError> {
            self.calls.lock().unwrap().push((city.to_string(), check_in, check_out));
            self.offers
                .clone()
                .map_err(|()| IntegrationError::Network("connection reset".to_string()))
        }
    }

    fn no_flight() -> Result<Option<FlightOffer>, IntegrationError> {
        Ok(None)
    }

    fn failing_flight() -> Result<Option<FlightOffer>, IntegrationError> {
        Err(IntegrationError::RateLimit("SerpApi API rate limit exceeded".to_string()))
    }

    fn flight_450() -> Result<Option<FlightOffer>, IntegrationError> {
        Ok(Some(FlightOffer {
            price: 450.0,
            airline: "Air France".to_string(),
            logo: None,
            duration_minutes: 185,
            departure: "2025-06-01 08:10".to_string(),
            arrival: "2025-06-01 11:15".to_string(),
            stops: 0,
            link: "https://flights.test/af".to_string(),
        }))
    }

    fn hotel(name: &str, price: f64, image: Option<&str>) -> HotelOffer {
        HotelOffer {
            name: name.to_string(),
            price,
            rating: 4.7,
            image: image.map(str::to_string),
            link: format!("https://hotels.test/{name}"),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn day(n: u32, city: &str, nightly: i64, transport: Option<Transport>) -> TripDay {
        TripDay {
            date: date(n),
            city: city.to_string(),
            activities: vec![],
            accommodation: Accommodation {
                name: format!("Grand Plaza {city}"),
                price: nightly,
                rating: 4.2,
                image: Some("https://img.test/mock.jpg".to_string()),
                booking_link: String::new(),
                is_real_data: false,
            },
            transport,
        }
    }

    fn leg(kind: TransportKind, from: &str, to: &str, price: i64) -> Transport {
        Transport {
            kind,
            from: from.to_string(),
            to: to.to_string(),
            duration: "Flight".to_string(),
            price,
            booking_link: String::new(),
            provider: None,
            is_real_data: false,
        }
    }

    /// Paris x3 (flight 300, 120/night), London x2 (train 100, 120/night): 1000 total
    fn baseline(tags: Vec<TripTag>) -> TripItinerary {
        let days = vec![
            day(1, "Paris", 120, Some(leg(TransportKind::Flight, "Casablanca", "Paris", 300))),
            day(2, "Paris", 120, None),
            day(3, "Paris", 120, None),
            day(4, "London", 120, Some(leg(TransportKind::Train, "Paris", "London", 100))),
            day(5, "London", 120, None),
        ];
        let mut itinerary = TripItinerary {
            id: "trip-standard-1".to_string(),
            name: "Best of Paris & London".to_string(),
            total_price: 0,
            duration_days: 5,
            travelers: 1,
            days,
            tags,
            image: String::new(),
            video: String::new(),
        };
        itinerary.total_price = itinerary.computed_total();
        itinerary
    }

    fn inputs(travelers: u32) -> PlannerInputs {
        PlannerInputs {
            start_location: Some("Casablanca".to_string()),
            destinations: vec!["Paris".to_string()],
            destination_query: None,
            start_date: date(1),
            end_date: date(5),
            budget: None,
            travelers,
            interests: vec![],
        }
    }

    #[tokio::test]
    async fn test_flight_offer_adjusts_total_by_delta() {
        let base = baseline(vec![TripTag::Recommended]);
        assert_eq!(base.total_price, 1000);

        let enriched = enrich_itinerary(
            &base,
            &inputs(1),
            &FakeFlights { result: flight_450 },
            &FakeHotels::with(vec![]),
        )
        .await;

        assert_eq!(enriched.total_price, 1150);
        let leg = enriched.days[0].transport.as_ref().unwrap();
        assert_eq!(leg.price, 450);
        assert_eq!(leg.duration, "3h 5m");
        assert_eq!(leg.provider.as_deref(), Some("Air France"));
        assert!(leg.is_real_data);
        assert_eq!(enriched.total_price, enriched.computed_total());
        assert_eq!(base.total_price, 1000);
    }

    #[tokio::test]
    async fn test_flight_price_covers_all_travelers() {
        let base = baseline(vec![]);
        let enriched = enrich_itinerary(
            &base,
            &inputs(2),
            &FakeFlights { result: flight_450 },
            &FakeHotels::with(vec![]),
        )
        .await;
        assert_eq!(enriched.days[0].transport.as_ref().unwrap().price, 900);
        assert_eq!(enriched.total_price, 1600);
    }

    #[tokio::test]
    async fn test_flight_failure_or_none_keeps_leg() {
        let base = baseline(vec![]);
        for result in [no_flight as fn() -> _, failing_flight] {
            let enriched = enrich_itinerary(
                &base,
                &inputs(1),
                &FakeFlights { result },
                &FakeHotels::failing(),
            )
            .await;
            assert_eq!(enriched, base);
        }
    }

    #[tokio::test]
    async fn test_hotel_overlay_covers_first_city_block_only() {
        let base = baseline(vec![TripTag::Recommended]);
        let hotels = FakeHotels::with(vec![
            hotel("Hotel Lutetia", 210.4, None),
            hotel("Le Meurice", 640.0, Some("https://img.test/meurice.jpg")),
        ]);

        let enriched =
            enrich_itinerary(&base, &inputs(1), &FakeFlights { result: no_flight }, &hotels).await;

        let calls = hotels.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("Paris".to_string(), date(1), date(4))]);

        for d in &enriched.days[..3] {
            assert_eq!(d.accommodation.name, "Hotel Lutetia");
            assert_eq!(d.accommodation.price, 210);
            assert_eq!(d.accommodation.image.as_deref(), Some("https://img.test/mock.jpg"));
            assert!(d.accommodation.is_real_data);
        }
        for d in &enriched.days[3..] {
            assert_eq!(d.accommodation, base.days[3].accommodation);
        }
        assert_eq!(enriched.total_price, 1000 + 3 * (210 - 120));
        assert_eq!(enriched.total_price, enriched.computed_total());
    }

    #[tokio::test]
    async fn test_luxury_picks_second_hotel() {
        let base = baseline(vec![TripTag::Luxury]);
        let hotels = FakeHotels::with(vec![
            hotel("Ibis", 90.0, None),
            hotel("Le Meurice", 640.0, Some("https://img.test/meurice.jpg")),
        ]);
        let enriched =
            enrich_itinerary(&base, &inputs(1), &FakeFlights { result: no_flight }, &hotels).await;
        assert_eq!(enriched.days[0].accommodation.name, "Le Meurice");
        assert_eq!(
            enriched.days[0].accommodation.image.as_deref(),
            Some("https://img.test/meurice.jpg")
        );

        let single = FakeHotels::with(vec![hotel("Ibis", 90.0, None)]);
        let enriched =
            enrich_itinerary(&base, &inputs(1), &FakeFlights { result: no_flight }, &single).await;
        assert_eq!(enriched.days[0].accommodation.name, "Ibis");
    }

    #[tokio::test]
    async fn test_non_flight_first_leg_is_not_searched() {
        let mut base = baseline(vec![]);
        base.days[0].transport = Some(leg(TransportKind::Bus, "Lyon", "Paris", 40));
        base.total_price = base.computed_total();
        let enriched = enrich_itinerary(
            &base,
            &inputs(1),
            &FakeFlights { result: flight_450 },
            &FakeHotels::with(vec![]),
        )
        .await;
        assert_eq!(enriched, base);
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_cardinality() {
        let baselines = vec![
            baseline(vec![TripTag::Recommended]),
            baseline(vec![TripTag::Cheapest]),
            baseline(vec![TripTag::Luxury]),
        ];
        let hotels = FakeHotels::with(vec![hotel("A", 100.0, None), hotel("B", 300.0, None)]);
        let enriched = enrich_itineraries(
            &baselines,
            &inputs(1),
            &FakeFlights { result: flight_450 },
            &hotels,
        )
        .await;

        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[0].tags, vec![TripTag::Recommended]);
        assert_eq!(enriched[0].days[0].accommodation.name, "A");
        assert_eq!(enriched[2].days[0].accommodation.name, "B");
        assert_eq!(hotels.calls.lock().unwrap().len(), 3);
        for itinerary in &enriched {
            assert_eq!(itinerary.total_price, itinerary.computed_total());
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(185), "3h 5m");
        assert_eq!(format_duration(45), "0h 45m");
        assert_eq!(format_duration(120), "2h 0m");
    }
}
