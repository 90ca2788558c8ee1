//! Geography: countries, cities, map coordinates and proximity search

pub mod cities;
pub mod countries;
pub mod resolver;
pub mod url_parsers;

pub use crate::models::GeoPoint;
pub use cities::{canonical_city_name, city_coordinates};
pub use countries::{Country, country_name, resolve_country};
pub use resolver::{CoordinateResolver, CoordinateSource};
pub use url_parsers::{AtSignParser, DataParamParser, QueryParamParser, UrlCoordinateParser};

/// Proximity queries over already-resolved points
pub struct GeographicSearch;

impl GeographicSearch {
    /// The `limit` items closest to `center`, nearest first, with their distance in km
    #[must_use]
    pub fn nearest<T>(items: Vec<(T, GeoPoint)>, center: &GeoPoint, limit: usize) -> Vec<(T, f64)> {
        let mut with_distance: Vec<(T, f64)> = items
            .into_iter()
            .map(|(item, point)| {
                let distance = center.distance_km(&point);
                (item, distance)
            })
            .collect();

        with_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
        with_distance.truncate(limit);
        with_distance
    }

    /// Items within `radius_km` of `center`
    #[must_use]
    pub fn within_radius<T>(items: Vec<(T, GeoPoint)>, center: &GeoPoint, radius_km: f64) -> Vec<T> {
        items
            .into_iter()
            .filter(|(_, point)| center.distance_km(point) <= radius_km)
            .map(|(item, _)| item)
            .collect()
    }
}
