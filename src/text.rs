//! Text helpers shared by the seed job, submissions and search

/// Category labels as scraped (Arabic, French) mapped to English
const CATEGORY_MAP: &[(&str, &str)] = &[
    ("مكتب سفريات", "Travel Agency"),
    ("وكالة سياحية", "Tourism Agency"),
    ("وكالة عمل جولات في المعالم السياحية", "Tour Operator"),
    ("شركة سياحية لتنظيم رحلات غوص السكوبا", "Adventure Tours"),
    ("وكالة تسويق", "Marketing Agency"),
    ("Agence de voyages", "Travel Agency"),
    ("Agence de visites touristiques", "Tour Operator"),
];

const DEFAULT_CATEGORY: &str = "Travel Agency";

/// URL slug: lower-case ASCII words joined by single dashes.
///
/// Characters outside `[a-z0-9_-]` are dropped, so a title written
/// entirely in another script yields an empty slug.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.trim().to_lowercase().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_dash = true;
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        }
    }

    slug
}

/// True if any character falls in an Arabic Unicode block
#[must_use]
pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}')
    })
}

/// Normalized column form: trimmed and lower-cased
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// English category label for a raw scraped category
#[must_use]
pub fn english_category(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return DEFAULT_CATEGORY.to_string();
    };
    CATEGORY_MAP
        .iter()
        .find(|(from, _)| *from == raw)
        .map_or_else(|| raw.to_string(), |(_, to)| (*to).to_string())
}

/// Title-case a normalized value for display (`new york` -> `New York`)
#[must_use]
pub fn display_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Atlas Voyages", "atlas-voyages")]
    #[case("  Sahara   Tours & Travel  ", "sahara-tours-travel")]
    #[case("--Marrakech--Express--", "marrakech-express")]
    #[case("Café Voyage", "caf-voyage")]
    #[case("snake_case_name", "snake_case_name")]
    #[case("مكتب سفريات", "")]
    fn test_slugify(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[rstest]
    #[case("وكالة الأطلس", true)]
    #[case("Atlas Voyages", false)]
    #[case("Atlas سفريات", true)]
    #[case("Agence de voyages", false)]
    fn test_contains_arabic(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(contains_arabic(input), expected);
    }

    #[test]
    fn test_english_category() {
        assert_eq!(english_category(Some("مكتب سفريات")), "Travel Agency");
        assert_eq!(english_category(Some("Agence de visites touristiques")), "Tour Operator");
        assert_eq!(english_category(Some("Travel Agency")), "Travel Agency");
        assert_eq!(english_category(Some("Cruise Line")), "Cruise Line");
        assert_eq!(english_category(None), "Travel Agency");
    }

    #[test]
    fn test_normalize_and_display() {
        assert_eq!(normalize("  New York "), "new york");
        assert_eq!(display_case("new york"), "New York");
        assert_eq!(display_case("travel agency"), "Travel Agency");
    }
}
