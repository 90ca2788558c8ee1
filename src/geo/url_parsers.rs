//! Coordinate extraction from Google Maps URLs
//!
//! Maps links come in several shapes; each strategy recognizes one of them.

use regex::Regex;
use std::sync::LazyLock;

use super::GeoPoint;

static AT_SIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(-?\d+\.\d+),(-?\d+\.\d+)").expect("valid regex"));

static QUERY_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[?&](?:q|query|ll)=(-?\d+\.\d+)(?:,|%2C)\s*(-?\d+\.\d+)").expect("valid regex")
});

static DATA_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!3d(-?\d+\.\d+)!4d(-?\d+\.\d+)").expect("valid regex"));

/// One way of reading coordinates out of a URL
pub trait UrlCoordinateParser: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, url: &str) -> Option<GeoPoint>;
}

fn capture_point(pattern: &Regex, url: &str) -> Option<GeoPoint> {
    let captures = pattern.captures(url)?;
    let lat = captures.get(1)?.as_str().parse().ok()?;
    let lng = captures.get(2)?.as_str().parse().ok()?;
    GeoPoint::checked(lat, lng)
}

/// `.../@34.0522,-118.2437,15z`
pub struct AtSignParser;

impl UrlCoordinateParser for AtSignParser {
    fn name(&self) -> &'static str {
        "at_sign"
    }

    fn parse(&self, url: &str) -> Option<GeoPoint> {
        capture_point(&AT_SIGN, url)
    }
}

/// `?q=34.05,-118.24`, `?query=...`, `&ll=...`
pub struct QueryParamParser;

impl UrlCoordinateParser for QueryParamParser {
    fn name(&self) -> &'static str {
        "query_param"
    }

    fn parse(&self, url: &str) -> Option<GeoPoint> {
        capture_point(&QUERY_PARAM, url)
    }
}

/// `data=!3m1!4b1!4m6!3m5!...!3d34.05!4d-118.24`
pub struct DataParamParser;

impl UrlCoordinateParser for DataParamParser {
    fn name(&self) -> &'static str {
        "data_param"
    }

    fn parse(&self, url: &str) -> Option<GeoPoint> {
        capture_point(&DATA_PARAM, url)
    }
}

/// Strategies in the order they are tried
#[must_use]
pub fn default_parsers() -> Vec<Box<dyn UrlCoordinateParser>> {
    vec![
        Box::new(AtSignParser),
        Box::new(QueryParamParser),
        Box::new(DataParamParser),
    ]
}
