//! Map coordinates for agencies

use tracing::debug;

use super::cities::city_coordinates;
use super::url_parsers::{UrlCoordinateParser, default_parsers};
use super::GeoPoint;
use crate::models::Agency;

/// Where a resolved point came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSource {
    Stored,
    MapsUrl(&'static str),
    CityTable,
}

/// Resolves an agency's map position: stored columns, then the Maps URL,
/// then the static city table.
pub struct CoordinateResolver {
    parsers: Vec<Box<dyn UrlCoordinateParser>>,
}

impl Default for CoordinateResolver {
    fn default() -> Self {
        Self::new(default_parsers())
    }
}

impl CoordinateResolver {
    #[must_use]
    pub fn new(parsers: Vec<Box<dyn UrlCoordinateParser>>) -> Self {
        Self { parsers }
    }

    #[must_use]
    pub fn resolve(&self, agency: &Agency) -> Option<GeoPoint> {
        self.resolve_with_source(agency).map(|(point, _)| point)
    }

    #[must_use]
    pub fn resolve_with_source(&self, agency: &Agency) -> Option<(GeoPoint, CoordinateSource)> {
        if let Some(point) = agency.stored_point() {
            return Some((point, CoordinateSource::Stored));
        }

        if let Some(url) = agency.url.as_deref().filter(|u| !u.is_empty()) {
            for parser in &self.parsers {
                if let Some(point) = parser.parse(url) {
                    debug!(slug = %agency.slug, parser = parser.name(), "Coordinates from maps URL");
                    return Some((point, CoordinateSource::MapsUrl(parser.name())));
                }
            }
        }

        let city = agency
            .city_normalized
            .as_deref()
            .or(agency.city.as_deref())
            .filter(|c| !c.trim().is_empty())?;

        let point = city_coordinates(city, agency.country_code.as_deref());
        if point.is_none() {
            debug!(slug = %agency.slug, city, "No coordinates for agency");
        }
        point.map(|p| (p, CoordinateSource::CityTable))
    }
}
