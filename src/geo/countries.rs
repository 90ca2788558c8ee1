//! ISO country codes and English names

/// `(code, name)`; a few aliases (`UK`, `EH`) share a name with another code
const COUNTRIES: &[(&str, &str)] = &[
    // Africa
    ("MA", "Morocco"),
    ("EG", "Egypt"),
    ("TN", "Tunisia"),
    ("DZ", "Algeria"),
    ("ZA", "South Africa"),
    ("KE", "Kenya"),
    ("NG", "Nigeria"),
    ("GH", "Ghana"),
    ("EH", "Morocco"),
    // Europe
    ("FR", "France"),
    ("ES", "Spain"),
    ("IT", "Italy"),
    ("DE", "Germany"),
    ("GB", "United Kingdom"),
    ("UK", "United Kingdom"),
    ("NL", "Netherlands"),
    ("BE", "Belgium"),
    ("AT", "Austria"),
    ("CH", "Switzerland"),
    ("PT", "Portugal"),
    ("IE", "Ireland"),
    ("SE", "Sweden"),
    ("NO", "Norway"),
    ("DK", "Denmark"),
    ("FI", "Finland"),
    ("PL", "Poland"),
    ("CZ", "Czech Republic"),
    ("GR", "Greece"),
    ("TR", "Turkey"),
    ("RU", "Russia"),
    ("IS", "Iceland"),
    ("HU", "Hungary"),
    ("RO", "Romania"),
    ("BG", "Bulgaria"),
    ("HR", "Croatia"),
    ("SK", "Slovakia"),
    ("SI", "Slovenia"),
    ("LU", "Luxembourg"),
    ("MT", "Malta"),
    ("CY", "Cyprus"),
    // North America
    ("US", "United States"),
    ("CA", "Canada"),
    ("MX", "Mexico"),
    // South America
    ("BR", "Brazil"),
    ("AR", "Argentina"),
    ("CL", "Chile"),
    ("CO", "Colombia"),
    ("PE", "Peru"),
    ("VE", "Venezuela"),
    ("EC", "Ecuador"),
    ("UY", "Uruguay"),
    // Asia
    ("AE", "United Arab Emirates"),
    ("SA", "Saudi Arabia"),
    ("QA", "Qatar"),
    ("KW", "Kuwait"),
    ("BH", "Bahrain"),
    ("OM", "Oman"),
    ("JO", "Jordan"),
    ("LB", "Lebanon"),
    ("IL", "Israel"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("CN", "China"),
    ("HK", "Hong Kong"),
    ("TW", "Taiwan"),
    ("SG", "Singapore"),
    ("MY", "Malaysia"),
    ("TH", "Thailand"),
    ("VN", "Vietnam"),
    ("ID", "Indonesia"),
    ("PH", "Philippines"),
    ("IN", "India"),
    ("PK", "Pakistan"),
    ("BD", "Bangladesh"),
    ("LK", "Sri Lanka"),
    ("NP", "Nepal"),
    ("MM", "Myanmar"),
    ("KH", "Cambodia"),
    ("LA", "Laos"),
    // Oceania
    ("AU", "Australia"),
    ("NZ", "New Zealand"),
    ("FJ", "Fiji"),
    // Caribbean
    ("JM", "Jamaica"),
    ("CU", "Cuba"),
    ("DO", "Dominican Republic"),
    ("PR", "Puerto Rico"),
    ("TT", "Trinidad and Tobago"),
    ("BS", "Bahamas"),
];

/// A country resolved to both of its stored representations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// English name for an ISO code; unknown codes are returned as given
#[must_use]
pub fn country_name(code: &str) -> String {
    let code = code.trim();
    COUNTRIES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map_or_else(|| code.to_string(), |(_, name)| (*name).to_string())
}

/// Resolve a code or an English name (any case).
///
/// Unknown input resolves to itself on both sides, so filtering by a
/// country missing from the table still matches exact stored values.
#[must_use]
pub fn resolve_country(input: &str) -> Country {
    let input = input.trim();
    let found = COUNTRIES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(input))
        .or_else(|| {
            COUNTRIES
                .iter()
                .find(|(_, name)| name.eq_ignore_ascii_case(input))
        });

    match found {
        Some((code, name)) => Country {
            code: (*code).to_string(),
            name: (*name).to_string(),
        },
        None => Country {
            code: input.to_string(),
            name: input.to_string(),
        },
    }
}
