//! City names and reference coordinates

use super::GeoPoint;
use crate::text::normalize;

/// Scraped spellings mapped to the canonical English city name
const CITY_ALIASES: &[(&str, &str)] = &[
    ("الدار البيضاء", "Casablanca"),
    ("مراكش", "Marrakech"),
    ("الرباط", "Rabat"),
    ("أگادير", "Agadir"),
    ("فاس", "Fes"),
    ("طنجة", "Tangier"),
    ("تمارة", "Temara"),
    ("مكناس", "Meknes"),
    ("إنزكان", "Inezgane"),
    ("جليز،", "Gueliz"),
    ("قلعة مكونة", "Kelaat M'Gouna"),
    ("Tanger", "Tangier"),
    ("Fès", "Fes"),
    ("Marrakesh", "Marrakech"),
    ("Tétouan", "Tetouan"),
    ("Mhamid", "M'hamid"),
];

/// `(normalized city, country code, lat, lng)`
const CITY_COORDINATES: &[(&str, &str, f64, f64)] = &[
    // Morocco
    ("casablanca", "MA", 33.5731, -7.5898),
    ("marrakech", "MA", 31.6295, -7.9811),
    ("rabat", "MA", 34.0209, -6.8416),
    ("agadir", "MA", 30.4278, -9.5981),
    ("fes", "MA", 34.0181, -5.0078),
    ("tangier", "MA", 35.7595, -5.8340),
    ("temara", "MA", 33.9287, -6.9063),
    ("meknes", "MA", 33.8935, -5.5473),
    ("inezgane", "MA", 30.3552, -9.5361),
    ("gueliz", "MA", 31.6369, -8.0103),
    ("kelaat m'gouna", "MA", 31.2405, -6.1283),
    ("tetouan", "MA", 35.5889, -5.3626),
    ("ouarzazate", "MA", 30.9189, -6.8934),
    ("m'hamid", "MA", 29.8260, -5.7210),
    ("essaouira", "MA", 31.5085, -9.7595),
    ("oujda", "MA", 34.6814, -1.9086),
    ("chefchaouen", "MA", 35.1688, -5.2636),
    ("merzouga", "MA", 31.0802, -4.0133),
    ("el jadida", "MA", 33.2316, -8.5007),
    ("kenitra", "MA", 34.2610, -6.5802),
    ("mohammedia", "MA", 33.6866, -7.3830),
    // North Africa and Middle East
    ("cairo", "EG", 30.0444, 31.2357),
    ("tunis", "TN", 36.8065, 10.1815),
    ("algiers", "DZ", 36.7538, 3.0588),
    ("dubai", "AE", 25.2048, 55.2708),
    ("abu dhabi", "AE", 24.4539, 54.3773),
    ("riyadh", "SA", 24.7136, 46.6753),
    ("jeddah", "SA", 21.4858, 39.1925),
    ("doha", "QA", 25.2854, 51.5310),
    ("amman", "JO", 31.9454, 35.9284),
    ("istanbul", "TR", 41.0082, 28.9784),
    // Europe
    ("paris", "FR", 48.8566, 2.3522),
    ("lyon", "FR", 45.7640, 4.8357),
    ("marseille", "FR", 43.2965, 5.3698),
    ("london", "GB", 51.5074, -0.1278),
    ("edinburgh", "GB", 55.9533, -3.1883),
    ("madrid", "ES", 40.4168, -3.7038),
    ("barcelona", "ES", 41.3874, 2.1686),
    ("lisbon", "PT", 38.7223, -9.1393),
    ("rome", "IT", 41.9028, 12.4964),
    ("florence", "IT", 43.7696, 11.2558),
    ("berlin", "DE", 52.5200, 13.4050),
    ("amsterdam", "NL", 52.3676, 4.9041),
    ("brussels", "BE", 50.8503, 4.3517),
    ("prague", "CZ", 50.0755, 14.4378),
    ("budapest", "HU", 47.4979, 19.0402),
    // Americas
    ("new york", "US", 40.7128, -74.0060),
    ("washington dc", "US", 38.9072, -77.0369),
    ("paris", "US", 33.6609, -95.5555),
    ("toronto", "CA", 43.6532, -79.3832),
    ("montreal", "CA", 45.5017, -73.5673),
    ("mexico city", "MX", 19.4326, -99.1332),
    // Asia
    ("tokyo", "JP", 35.6762, 139.6503),
    ("kyoto", "JP", 35.0116, 135.7681),
    ("bangkok", "TH", 13.7563, 100.5018),
    ("bali", "ID", -8.3405, 115.0920),
    ("ho chi minh city", "VN", 10.8231, 106.6297),
    ("singapore", "SG", 1.3521, 103.8198),
];

/// Canonical English name for a scraped city spelling
#[must_use]
pub fn canonical_city_name(raw: &str) -> String {
    let raw = raw.trim();
    CITY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == raw)
        .map_or_else(|| raw.to_string(), |(_, name)| (*name).to_string())
}

/// Reference coordinates for a city.
///
/// With a country code only entries from that country match; without one
/// the first entry with the name wins.
#[must_use]
pub fn city_coordinates(city: &str, country_code: Option<&str>) -> Option<GeoPoint> {
    let key = normalize(&canonical_city_name(city));
    let mut candidates = CITY_COORDINATES.iter().filter(|(name, ..)| *name == key);

    let entry = match country_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => candidates.find(|(_, c, ..)| c.eq_ignore_ascii_case(code)),
        None => candidates.next(),
    };

    entry.map(|(_, _, lat, lng)| GeoPoint::new(*lat, *lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_city_name() {
        assert_eq!(canonical_city_name("مراكش"), "Marrakech");
        assert_eq!(canonical_city_name("Tanger"), "Tangier");
        assert_eq!(canonical_city_name("Lyon"), "Lyon");
    }

    #[test]
    fn test_city_coordinates_disambiguates_by_country() {
        let france = city_coordinates("Paris", Some("FR")).unwrap();
        let texas = city_coordinates("paris", Some("us")).unwrap();
        assert!(france.lat > 48.0);
        assert!(texas.lng < -90.0);
        assert!(city_coordinates("Paris", Some("MA")).is_none());
    }

    #[test]
    fn test_city_coordinates_accepts_aliases_and_case() {
        let point = city_coordinates("الدار البيضاء", Some("MA")).unwrap();
        assert_eq!(point, GeoPoint::new(33.5731, -7.5898));
        assert!(city_coordinates("  CASABLANCA ", None).is_some());
        assert!(city_coordinates("Atlantis", None).is_none());
    }
}
