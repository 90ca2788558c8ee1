//! Agency search semantics
//!
//! A filter is resolved once into [`ResolvedFilter`], which can either
//! test records in memory or render itself as hosted table-API parameters.
//! Both forms must select and order the same rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::geo::{Country, resolve_country};
use crate::models::Agency;
use crate::text::normalize;

pub const DEFAULT_PAGE_SIZE: u32 = 24;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteFilter {
    #[default]
    All,
    With,
    Without,
}

/// Search form as it arrives from the listing page
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AgencyFilter {
    #[serde(alias = "q")]
    pub query: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(alias = "rating")]
    pub min_rating: Option<f64>,
    pub category: Option<String>,
    pub website: WebsiteFilter,
    /// 1-based
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// One page of results plus the total match count
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AgencyPage {
    pub agencies: Vec<Agency>,
    pub total: u64,
}

impl AgencyPage {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A filter with inputs trimmed, normalized and resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub query: Option<String>,
    pub city: Option<String>,
    pub country: Option<Country>,
    pub min_rating: Option<f64>,
    pub category: Option<String>,
    pub website: WebsiteFilter,
    pub offset: u64,
    pub limit: u32,
}

/// Normalized and stripped of filter syntax, so both store backends see the same text
fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| normalize(&sanitize_filter_value(v)))
        .filter(|v| !v.is_empty())
}

impl AgencyFilter {
    #[must_use]
    pub fn resolve(&self) -> ResolvedFilter {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);

        ResolvedFilter {
            query: non_empty(self.query.as_ref()),
            city: non_empty(self.city.as_ref()),
            country: self
                .country
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(resolve_country),
            min_rating: self.min_rating.filter(|r| *r > 0.0),
            category: non_empty(self.category.as_ref()),
            website: self.website,
            offset: u64::from(page - 1) * u64::from(limit),
            limit,
        }
    }
}

fn eq_ignore_case(stored: Option<&str>, wanted: &str) -> bool {
    stored.is_some_and(|s| s.trim().eq_ignore_ascii_case(wanted) || normalize(s) == normalize(wanted))
}

fn contains_normalized(stored: Option<&str>, needle: &str) -> bool {
    stored.is_some_and(|s| s.to_lowercase().contains(needle))
}

impl ResolvedFilter {
    /// Whether a visible agency passes every criterion
    #[must_use]
    pub fn matches(&self, agency: &Agency) -> bool {
        if !agency.is_visible() {
            return false;
        }

        if let Some(query) = &self.query
            && !(agency.title.to_lowercase().contains(query.as_str())
                || contains_normalized(agency.city_normalized.as_deref(), query)
                || contains_normalized(agency.category_normalized.as_deref(), query))
        {
            return false;
        }

        if let Some(city) = &self.city
            && agency.city_normalized.as_deref().map(normalize).as_ref() != Some(city)
        {
            return false;
        }

        if let Some(country) = &self.country {
            let stored = [
                agency.country_code.as_deref(),
                agency.country_normalized.as_deref(),
            ];
            let hit = stored.iter().any(|value| {
                eq_ignore_case(*value, &country.code) || eq_ignore_case(*value, &country.name)
            });
            if !hit {
                return false;
            }
        }

        if let Some(rating) = self.min_rating
            && agency.score() < rating
        {
            return false;
        }

        if let Some(category) = &self.category
            && agency.category_normalized.as_deref().map(normalize).as_ref() != Some(category)
        {
            return false;
        }

        match self.website {
            WebsiteFilter::All => true,
            WebsiteFilter::With => agency.has_website(),
            WebsiteFilter::Without => !agency.has_website(),
        }
    }

    /// Hosted table-API filter parameters (unencoded), without paging
    #[must_use]
    pub fn postgrest_filters(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("status", "eq.approved".to_string()),
            ("deleted_at", "is.null".to_string()),
        ];
        let mut or_groups: Vec<String> = Vec::new();

        if let Some(query) = &self.query {
            let q = sanitize_filter_value(query);
            or_groups.push(format!(
                "title.ilike.*{q}*,city_normalized.ilike.*{q}*,category_normalized.ilike.*{q}*"
            ));
        }

        if let Some(city) = &self.city {
            params.push(("city_normalized", format!("eq.{}", sanitize_filter_value(city))));
        }

        if let Some(country) = &self.country {
            let code = sanitize_filter_value(&country.code);
            let name = sanitize_filter_value(&country.name);
            or_groups.push(format!(
                "country_code.ilike.\"{code}\",country_code.ilike.\"{name}\",country_normalized.ilike.\"{code}\",country_normalized.ilike.\"{name}\""
            ));
        }

        if let Some(rating) = self.min_rating {
            params.push(("total_score", format!("gte.{rating}")));
        }

        if let Some(category) = &self.category {
            params.push((
                "category_normalized",
                format!("eq.{}", sanitize_filter_value(category)),
            ));
        }

        match self.website {
            WebsiteFilter::All => {}
            WebsiteFilter::With => {
                params.push(("website", "not.is.null".to_string()));
                params.push(("website", "neq.".to_string()));
            }
            WebsiteFilter::Without => or_groups.push("website.is.null,website.eq.".to_string()),
        }

        match or_groups.len() {
            0 => {}
            1 => params.push(("or", format!("({})", or_groups[0]))),
            _ => {
                let joined = or_groups
                    .iter()
                    .map(|group| format!("or({group})"))
                    .collect::<Vec<_>>()
                    .join(",");
                params.push(("and", format!("({joined})")));
            }
        }

        params
    }
}

/// Strip characters that carry meaning inside a table-API filter expression
#[must_use]
pub fn sanitize_filter_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '"' | '*' | '\\'))
        .collect()
}

fn desc_nulls_last<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Listing order: featured first, then rating, then review count, all descending
#[must_use]
pub fn listing_order(a: &Agency, b: &Agency) -> Ordering {
    b.featured
        .cmp(&a.featured)
        .then_with(|| desc_nulls_last(a.total_score, b.total_score))
        .then_with(|| desc_nulls_last(a.reviews_count, b.reviews_count))
}

/// Sort table-API style
pub const POSTGREST_ORDER: &str = "featured.desc,total_score.desc.nullslast,reviews_count.desc.nullslast";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewStatus;
    use rstest::rstest;

    fn agency(title: &str, country_code: &str, country: &str, score: Option<f64>) -> Agency {
        Agency {
            slug: crate::text::slugify(title),
            title: title.to_string(),
            city_normalized: Some("casablanca".to_string()),
            category_normalized: Some("travel agency".to_string()),
            country_code: Some(country_code.to_string()),
            country_normalized: Some(country.to_string()),
            total_score: score,
            status: ReviewStatus::Approved,
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_clamps_paging() {
        let filter = AgencyFilter {
            page: Some(0),
            limit: Some(500),
            ..Default::default()
        };
        let resolved = filter.resolve();
        assert_eq!(resolved.limit, MAX_PAGE_SIZE);
        assert_eq!(resolved.offset, 0);

        let filter = AgencyFilter {
            page: Some(3),
            ..Default::default()
        };
        let resolved = filter.resolve();
        assert_eq!(resolved.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(resolved.offset, 48);
    }

    #[rstest]
    #[case("Morocco")]
    #[case("morocco")]
    #[case("MA")]
    fn test_country_matches_code_or_name(#[case] input: &str) {
        let filter = AgencyFilter {
            country: Some(input.to_string()),
            ..Default::default()
        }
        .resolve();

        assert!(filter.matches(&agency("Atlas Voyages", "MA", "morocco", None)));
        assert!(filter.matches(&agency("Sahara Trips", "", "Morocco", None)));
        assert!(filter.matches(&agency("Code Only", "MA", "", None)));
        assert!(!filter.matches(&agency("Paris Tours", "FR", "france", None)));
    }

    #[test]
    fn test_query_matches_title_city_or_category() {
        let filter = AgencyFilter {
            query: Some("CASA".to_string()),
            ..Default::default()
        }
        .resolve();
        assert!(filter.matches(&agency("Atlas Voyages", "MA", "morocco", None)));

        let filter = AgencyFilter {
            query: Some("tokyo".to_string()),
            ..Default::default()
        }
        .resolve();
        assert!(!filter.matches(&agency("Atlas Voyages", "MA", "morocco", None)));
    }

    #[test]
    fn test_query_syntax_is_stripped_once() {
        let filter = AgencyFilter {
            query: Some(" Atlas (Voyages) ".to_string()),
            category: Some("\"travel agency\"".to_string()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(filter.query.as_deref(), Some("atlas voyages"));
        assert_eq!(filter.category.as_deref(), Some("travel agency"));
        assert!(filter.matches(&agency("Atlas Voyages", "MA", "morocco", None)));
        assert!(filter.postgrest_filters().contains(&(
            "or",
            "(title.ilike.*atlas voyages*,city_normalized.ilike.*atlas voyages*,category_normalized.ilike.*atlas voyages*)".to_string()
        )));

        let only_syntax = AgencyFilter {
            query: Some("(*)".to_string()),
            ..Default::default()
        }
        .resolve();
        assert_eq!(only_syntax.query, None);
    }

    #[test]
    fn test_min_rating_and_website() {
        let filter = AgencyFilter {
            min_rating: Some(4.0),
            website: WebsiteFilter::Without,
            ..Default::default()
        }
        .resolve();

        assert!(filter.matches(&agency("Good", "MA", "morocco", Some(4.0))));
        assert!(!filter.matches(&agency("Okay", "MA", "morocco", Some(3.9))));
        assert!(!filter.matches(&agency("Unrated", "MA", "morocco", None)));

        let mut with_site = agency("Site", "MA", "morocco", Some(4.5));
        with_site.website = Some("https://site.ma".to_string());
        assert!(!filter.matches(&with_site));
    }

    #[test]
    fn test_hidden_agencies_never_match() {
        let filter = AgencyFilter::default().resolve();
        let mut pending = agency("Pending", "MA", "morocco", Some(5.0));
        pending.status = ReviewStatus::Pending;
        assert!(!filter.matches(&pending));
    }

    #[test]
    fn test_listing_order() {
        let mut featured = agency("Featured", "MA", "morocco", Some(3.0));
        featured.featured = true;
        let mut top = agency("Top", "MA", "morocco", Some(4.9));
        top.reviews_count = Some(10);
        let mut top_more_reviews = agency("Top More", "MA", "morocco", Some(4.9));
        top_more_reviews.reviews_count = Some(300);
        let unrated = agency("Unrated", "MA", "morocco", None);

        let mut all = vec![unrated, top, featured, top_more_reviews];
        all.sort_by(listing_order);
        let titles: Vec<_> = all.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Featured", "Top More", "Top", "Unrated"]);
    }

    #[test]
    fn test_postgrest_filters_single_or_group() {
        let filter = AgencyFilter {
            query: Some("atlas (casa)".to_string()),
            city: Some(" Casablanca ".to_string()),
            min_rating: Some(4.0),
            ..Default::default()
        }
        .resolve();
        let params = filter.postgrest_filters();

        assert!(params.contains(&("status", "eq.approved".to_string())));
        assert!(params.contains(&("deleted_at", "is.null".to_string())));
        assert!(params.contains(&("city_normalized", "eq.casablanca".to_string())));
        assert!(params.contains(&("total_score", "gte.4".to_string())));
        assert!(params.contains(&(
            "or",
            "(title.ilike.*atlas casa*,city_normalized.ilike.*atlas casa*,category_normalized.ilike.*atlas casa*)".to_string()
        )));
    }

    #[test]
    fn test_postgrest_filters_combine_or_groups() {
        let filter = AgencyFilter {
            country: Some("Morocco".to_string()),
            website: WebsiteFilter::Without,
            ..Default::default()
        }
        .resolve();
        let params = filter.postgrest_filters();
        let and = params.iter().find(|(k, _)| *k == "and").map(|(_, v)| v.clone());
        let and = and.unwrap();
        assert!(and.starts_with("(or(country_code.ilike.\"MA\""));
        assert!(and.ends_with(",or(website.is.null,website.eq.))"));
        assert!(!params.iter().any(|(k, _)| *k == "or"));
    }
}
