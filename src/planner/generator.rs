//! Baseline itinerary generation
//!
//! Produces three variations (standard, budget, luxury) from the planner
//! form with plausible mock prices, hotels and activities. Prices are later
//! replaced by live offers during enrichment.

use chrono::{Duration, NaiveDate, Utc};
use rand::{Rng, RngExt};

use crate::integrations::serp::airport_code;
use crate::models::{
    Accommodation, PlannerInputs, Transport, TransportKind, TripDay, TripItinerary, TripTag,
};

const DEFAULT_CITY: &str = "Paris";

const CHEAP_HUBS: &[&str] = &[
    "Lisbon",
    "Prague",
    "Bangkok",
    "Bali",
    "Budapest",
    "Marrakech",
    "Istanbul",
    "Mexico City",
    "Ho Chi Minh City",
    "Cairo",
];

struct CityMedia {
    city: &'static str,
    image: &'static str,
    video: &'static str,
}

const CITY_MEDIA: &[CityMedia] = &[
    CityMedia {
        city: "Paris",
        image: "https://images.unsplash.com/photo-1502602898657-3e91760cbb34?q=80",
        video: "https://videos.pexels.com/video-files/3773489/3773489-hd_1920_1080_30fps.mp4",
    },
    CityMedia {
        city: "Tokyo",
        image: "https://images.unsplash.com/photo-1503899036084-c55cdd92da26?q=80",
        video: "https://videos.pexels.com/video-files/5827618/5827618-hd_1920_1080_30fps.mp4",
    },
    CityMedia {
        city: "New York",
        image: "https://images.unsplash.com/photo-1496442226666-8d4d0e62e6e9?q=80",
        video: "https://videos.pexels.com/video-files/3121459/3121459-hd_1920_1080_25fps.mp4",
    },
    CityMedia {
        city: "London",
        image: "https://images.unsplash.com/photo-1513635269975-59663e0ac1ad?q=80",
        video: "https://videos.pexels.com/video-files/4505500/4505500-hd_1920_1080_30fps.mp4",
    },
    CityMedia {
        city: "Dubai",
        image: "https://images.unsplash.com/photo-1512453979798-5ea90b2009f4?q=80",
        video: "https://videos.pexels.com/video-files/3763071/3763071-hd_1920_1080_25fps.mp4",
    },
    CityMedia {
        city: "Bali",
        image: "https://images.unsplash.com/photo-1537996194471-e657df975ab4?q=80",
        video: "https://videos.pexels.com/video-files/2162985/2162985-hd_1920_1080_30fps.mp4",
    },
    CityMedia {
        city: "Lisbon",
        image: "https://images.unsplash.com/photo-1548707304-4eb70f7b588c?q=80",
        video: "https://videos.pexels.com/video-files/3973797/3973797-hd_1920_1080_25fps.mp4",
    },
    CityMedia {
        city: "Prague",
        image: "https://images.unsplash.com/photo-1519677100203-a0e668c92439?q=80",
        video: "https://videos.pexels.com/video-files/4252654/4252654-hd_1920_1080_30fps.mp4",
    },
    CityMedia {
        city: "Bangkok",
        image: "https://images.unsplash.com/photo-1508009603885-50cf7c579365?q=80",
        video: "https://videos.pexels.com/video-files/3124803/3124803-hd_1920_1080_30fps.mp4",
    },
    CityMedia {
        city: "Istanbul",
        image: "https://images.unsplash.com/photo-1524231757912-21f4fe3a7200?q=80",
        video: "https://videos.pexels.com/video-files/4563851/4563851-hd_1920_1080_30fps.mp4",
    },
];

const FALLBACK_MEDIA: CityMedia = CityMedia {
    city: "Default",
    image: "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1?q=80",
    video: "https://videos.pexels.com/video-files/855564/855564-hd_1920_1080_24fps.mp4",
};

const HOTEL_IMAGE: &str = "https://images.unsplash.com/photo-1566073771259-6a8506099945?q=80";

const HOTEL_CHAINS: &[&str] = &[
    "Grand Plaza",
    "City Center Inn",
    "Luxury Resort",
    "Boutique Stay",
    "Central Hostel",
    "Royal Suites",
    "Comfort Haven",
];

const ACTIVITY_TEMPLATES: &[(&str, [&str; 4])] = &[
    (
        "culture",
        ["Visit National Museum", "Old Town Walking Tour", "Art Gallery Exhibition", "Historical Castle Visit"],
    ),
    (
        "food",
        ["Street Food Tasting", "Michelin Star Dinner", "Local Market Tour", "Cooking Class"],
    ),
    (
        "nature",
        ["City Park Picnic", "Botanical Gardens", "River Cruise", "Sunset Hike"],
    ),
    (
        "shopping",
        ["Vintage Market Shopping", "Luxury Mall Visit", "Souvenir Hunting", "Fashion District Tour"],
    ),
    (
        "adventure",
        ["City Bike Tour", "Kayaking Adventure", "Climbing Gym", "Escape Room Challenge"],
    ),
    (
        "relaxation",
        ["Spa Day", "Beach Relaxation", "Coffee Shop Hopping", "Yoga Session"],
    ),
];

const DEFAULT_INTERESTS: &[&str] = &["culture", "food"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variation {
    Standard,
    Budget,
    Luxury,
}

impl Variation {
    fn as_str(self) -> &'static str {
        match self {
            Variation::Standard => "standard",
            Variation::Budget => "budget",
            Variation::Luxury => "luxury",
        }
    }

    fn tags(self) -> Vec<TripTag> {
        match self {
            Variation::Standard => vec![TripTag::Recommended, TripTag::Urban],
            Variation::Budget => vec![TripTag::Cheapest, TripTag::Urban],
            Variation::Luxury => vec![TripTag::Luxury, TripTag::Relaxation],
        }
    }

    fn nightly_base<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        match self {
            Variation::Budget => 50.0 + rng.random_range(0.0..30.0),
            Variation::Luxury => 250.0 + rng.random_range(0.0..200.0),
            Variation::Standard => 120.0 + rng.random_range(0.0..80.0),
        }
    }

    fn name(self, cities: &[String]) -> String {
        let first = cities.first().map_or(DEFAULT_CITY, String::as_str);
        match self {
            Variation::Standard => format!("Best of {}", cities.join(" & ")),
            Variation::Budget => format!("Budget Explorer: {first}"),
            Variation::Luxury => format!("Luxury Escape in {first}"),
        }
    }
}

/// Second stop suggested for single-city standard trips
fn companion_city(city: &str) -> &'static str {
    match city {
        "Paris" => "London",
        "London" => "Edinburgh",
        "Tokyo" => "Kyoto",
        "New York" => "Washington DC",
        "Barcelona" => "Madrid",
        "Rome" => "Florence",
        _ => "Nearby City",
    }
}

fn media_for(city: &str) -> &'static CityMedia {
    let lower = city.to_lowercase();
    CITY_MEDIA
        .iter()
        .find(|m| lower.contains(&m.city.to_lowercase()))
        .unwrap_or(&FALLBACK_MEDIA)
}

#[must_use]
pub fn google_flights_link(from: &str, to: &str, date: NaiveDate) -> String {
    format!(
        "https://www.google.com/flights?hl=en#flt={}.{}.{date};c:USD;e:1;sd:1;t:f",
        airport_code(from),
        airport_code(to)
    )
}

#[must_use]
pub fn google_hotels_link(city: &str, check_in: NaiveDate, check_out: NaiveDate) -> String {
    let query = format!("Hotels in {city} from {check_in} to {check_out}");
    format!(
        "https://www.google.com/travel/hotels?q={}",
        urlencoding::encode(&query)
    )
}

/// Inclusive day count between the dates, at least one
#[must_use]
pub fn trip_length(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days() + 1;
    u32::try_from(days.max(1)).unwrap_or(1)
}

fn destinations_for(inputs: &PlannerInputs) -> Vec<String> {
    let listed = inputs
        .destinations
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    if !listed.is_empty() {
        return listed;
    }
    inputs
        .destination_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map_or_else(|| vec![DEFAULT_CITY.to_string()], |q| vec![q.to_string()])
}

fn daily_activities<R: Rng + ?Sized>(interests: &[String], rng: &mut R) -> Vec<String> {
    let pool: Vec<String> = if interests.is_empty() {
        DEFAULT_INTERESTS.iter().map(|s| (*s).to_string()).collect()
    } else {
        interests.iter().map(|i| i.to_lowercase()).collect()
    };

    let mut picked: Vec<String> = Vec::with_capacity(2);
    for _ in 0..2 {
        let interest = &pool[rng.random_range(0..pool.len())];
        let options = ACTIVITY_TEMPLATES
            .iter()
            .find(|(name, _)| *name == interest.as_str())
            .map_or(&ACTIVITY_TEMPLATES[0].1, |(_, options)| options);
        let activity = options[rng.random_range(0..options.len())];
        if !picked.iter().any(|a| a == activity) {
            picked.push(activity.to_string());
        }
    }
    picked
}

/// Build one itinerary variation. `cities` overrides the form's destinations.
pub fn generate_variation<R: Rng + ?Sized>(
    inputs: &PlannerInputs,
    variation: Variation,
    cities: Option<Vec<String>>,
    rng: &mut R,
) -> TripItinerary {
    let start_location = inputs
        .start_location
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CITY)
        .to_string();
    let travelers = i64::from(inputs.travelers.max(1));

    let mut cities = cities.unwrap_or_else(|| destinations_for(inputs));
    if cities.is_empty() {
        cities.push(DEFAULT_CITY.to_string());
    }
    if cities.len() == 1 && variation == Variation::Standard {
        let companion = companion_city(&cities[0]);
        cities.push(companion.to_string());
    }

    let duration_days = trip_length(inputs.start_date, inputs.end_date);
    let city_count = u32::try_from(cities.len()).unwrap_or(u32::MAX);
    let days_per_city = duration_days / city_count;
    let extra_days = duration_days % city_count;

    let mut days = Vec::new();
    let mut current = inputs.start_date;

    for (index, city) in cities.iter().enumerate() {
        let index_u32 = u32::try_from(index).unwrap_or(u32::MAX);
        let stay = (days_per_city + u32::from(index_u32 < extra_days)).max(1);

        let chain = HOTEL_CHAINS[rng.random_range(0..HOTEL_CHAINS.len())];
        let hotel_name = format!("{chain} {city}");
        #[allow(clippy::cast_possible_truncation)]
        let nightly = variation.nightly_base(rng).round() as i64;

        let check_in = current;
        let check_out = check_in + Duration::days(i64::from(stay));
        let hotel_link = google_hotels_link(city, check_in, check_out);

        for day_in_city in 0..stay {
            let transport = (day_in_city == 0).then(|| {
                let (from, kind, price, duration) = if index == 0 {
                    let fare = if variation == Variation::Budget { 150 } else { 350 };
                    (start_location.clone(), TransportKind::Flight, fare, "Flight")
                } else if variation == Variation::Budget {
                    (cities[index - 1].clone(), TransportKind::Bus, 50, "4h 30m")
                } else {
                    (cities[index - 1].clone(), TransportKind::Train, 150, "1h 15m")
                };
                Transport {
                    kind,
                    booking_link: google_flights_link(&from, city, current),
                    from,
                    to: city.clone(),
                    duration: duration.to_string(),
                    price: price * travelers,
                    provider: None,
                    is_real_data: false,
                }
            });

            days.push(TripDay {
                date: current,
                city: city.clone(),
                activities: daily_activities(&inputs.interests, rng),
                accommodation: Accommodation {
                    name: hotel_name.clone(),
                    price: nightly,
                    rating: 4.0 + rng.random_range(0.0..1.0),
                    image: Some(HOTEL_IMAGE.to_string()),
                    booking_link: hotel_link.clone(),
                    is_real_data: false,
                },
                transport,
            });
            current += Duration::days(1);
        }
    }

    let media = media_for(&cities[0]);
    let mut itinerary = TripItinerary {
        id: format!("trip-{}-{}", variation.as_str(), Utc::now().timestamp_millis()),
        name: variation.name(&cities),
        total_price: 0,
        duration_days,
        travelers: inputs.travelers.max(1),
        days,
        tags: variation.tags(),
        image: media.image.to_string(),
        video: media.video.to_string(),
    };
    itinerary.total_price = itinerary.computed_total();
    itinerary
}

/// Standard, budget and luxury itineraries for the form. Without any
/// destination, distinct cheap hubs are picked at random.
pub fn generate_itineraries<R: Rng + ?Sized>(inputs: &PlannerInputs, rng: &mut R) -> Vec<TripItinerary> {
    if inputs.is_anywhere_search() {
        let mut hubs = CHEAP_HUBS.to_vec();
        for i in 0..4 {
            let j = rng.random_range(i..hubs.len());
            hubs.swap(i, j);
        }
        let hub = |i: usize| hubs[i].to_string();
        return vec![
            generate_variation(inputs, Variation::Budget, Some(vec![hub(0)]), rng),
            generate_variation(inputs, Variation::Standard, Some(vec![hub(1)]), rng),
            generate_variation(inputs, Variation::Luxury, Some(vec![hub(2), hub(3)]), rng),
        ];
    }

    vec![
        generate_variation(inputs, Variation::Standard, None, rng),
        generate_variation(inputs, Variation::Budget, None, rng),
        generate_variation(inputs, Variation::Luxury, None, rng),
    ]
}
