//! Sitemap and robots.txt generation

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::models::Agency;
use crate::{DirectoryError, Result};

pub const LOCALES: &[&str] = &["en", "fr", "ar"];
const DEFAULT_LOCALE: &str = "en";
const MAX_CITY_PAGES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: NaiveDate,
    pub change_frequency: ChangeFrequency,
    pub priority: f64,
    pub image: Option<String>,
}

struct StaticPage {
    path: &'static str,
    change_frequency: ChangeFrequency,
    priority: f64,
}

const STATIC_PAGES: &[StaticPage] = &[
    StaticPage { path: "", change_frequency: ChangeFrequency::Daily, priority: 1.0 },
    StaticPage { path: "/agencies", change_frequency: ChangeFrequency::Daily, priority: 0.95 },
    StaticPage { path: "/destinations", change_frequency: ChangeFrequency::Weekly, priority: 0.9 },
    StaticPage { path: "/planner", change_frequency: ChangeFrequency::Weekly, priority: 0.85 },
    StaticPage { path: "/blog", change_frequency: ChangeFrequency::Weekly, priority: 0.85 },
    StaticPage { path: "/for-agencies", change_frequency: ChangeFrequency::Monthly, priority: 0.7 },
    StaticPage { path: "/about", change_frequency: ChangeFrequency::Monthly, priority: 0.6 },
    StaticPage { path: "/contact", change_frequency: ChangeFrequency::Monthly, priority: 0.6 },
    StaticPage { path: "/privacy", change_frequency: ChangeFrequency::Yearly, priority: 0.3 },
    StaticPage { path: "/terms", change_frequency: ChangeFrequency::Yearly, priority: 0.3 },
];

/// (slug, published, cover image)
const BLOG_POSTS: &[(&str, &str, &str)] = &[
    ("can-2025-predictions-maroc-favori", "2025-01-15", "https://images.unsplash.com/photo-1522778119026-d647f0596c20?w=800&h=500&fit=crop"),
    ("can-2025-qui-va-gagner-pronostics", "2025-01-14", "https://images.unsplash.com/photo-1574629810360-7efbbe195018?w=800&h=500&fit=crop"),
    ("can-2025-maroc-parcours-mondial", "2025-01-13", "https://images.unsplash.com/photo-1489944440615-453fc2b6a9a9?w=800&h=500&fit=crop"),
    ("can-2025-calendrier-matchs-maroc", "2025-01-12", "https://images.unsplash.com/photo-1431324155629-1a6deb1dec8d?w=800&h=500&fit=crop"),
    ("can-2025-voyage-maroc-supporters", "2025-01-11", "https://images.unsplash.com/photo-1539020140153-e479b8c22e70?w=800&h=500&fit=crop"),
    ("can-2025-stades-maroc-villes-hotes", "2025-01-10", "https://images.unsplash.com/photo-1540747913346-19e32dc3e97e?w=800&h=500&fit=crop"),
    ("how-to-choose-travel-agency", "2024-12-15", "https://images.unsplash.com/photo-1488646953014-85cb44e25828?w=800&h=500&fit=crop"),
    ("top-destinations-2025", "2024-12-10", "https://images.unsplash.com/photo-1476514525535-07fb3b4ae5f1?w=800&h=500&fit=crop"),
    ("morocco-travel-guide", "2024-12-05", "https://images.unsplash.com/photo-1489749798305-4fea3ae63d43?w=800&h=500&fit=crop"),
    ("budget-travel-tips", "2024-12-01", "https://images.unsplash.com/photo-1503220317375-aaad61436b1b?w=800&h=500&fit=crop"),
    ("group-travel-benefits", "2024-11-28", "https://images.unsplash.com/photo-1527631746610-bca00a040d60?w=800&h=500&fit=crop"),
    ("travel-insurance-guide", "2024-11-25", "https://images.unsplash.com/photo-1436491865332-7a61a109cc05?w=800&h=500&fit=crop"),
];

/// Rating-driven priority with a bump for featured listings
#[must_use]
pub fn agency_priority(agency: &Agency) -> f64 {
    let base = match agency.total_score {
        Some(score) if score >= 4.5 => 0.85,
        Some(score) if score >= 4.0 => 0.75,
        Some(score) if score >= 3.5 => 0.7,
        _ => 0.6,
    };
    if agency.featured {
        f64::min(base + 0.1, 0.9)
    } else {
        base
    }
}

fn locale_prefix(locale: &str) -> String {
    if locale == DEFAULT_LOCALE {
        String::new()
    } else {
        format!("/{locale}")
    }
}

fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

pub struct SitemapBuilder {
    base_url: String,
    today: NaiveDate,
}

impl SitemapBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            today: Utc::now().date_naive(),
        }
    }

    #[must_use]
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// One entry per locale for a locale-independent path
    fn localized(
        &self,
        path: &str,
        last_modified: NaiveDate,
        change_frequency: ChangeFrequency,
        priority: f64,
        image: Option<&str>,
    ) -> impl Iterator<Item = SitemapEntry> + '_ {
        let path = path.to_string();
        let image = image.map(str::to_string);
        LOCALES.iter().map(move |locale| SitemapEntry {
            url: format!("{}{}{path}", self.base_url, locale_prefix(locale)),
            last_modified,
            change_frequency,
            priority,
            image: image.clone(),
        })
    }

    /// Static pages, blog posts, aggregation pages and agency profiles for
    /// every locale. Only publicly visible agencies are listed.
    pub fn build(&self, agencies: &[Agency]) -> Vec<SitemapEntry> {
        let visible: Vec<&Agency> = agencies.iter().filter(|a| a.is_visible()).collect();
        let mut entries = Vec::new();

        for page in STATIC_PAGES {
            entries.extend(self.localized(page.path, self.today, page.change_frequency, page.priority, None));
        }

        for (slug, published, image) in BLOG_POSTS {
            let published = published.parse().unwrap_or(self.today);
            entries.extend(self.localized(
                &format!("/blog/{slug}"),
                published,
                ChangeFrequency::Monthly,
                0.7,
                Some(*image),
            ));
        }

        let mut countries = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut cities: BTreeMap<(String, String), usize> = BTreeMap::new();
        for agency in &visible {
            if let Some(country) = agency.country_normalized.as_deref().filter(|c| !c.is_empty()) {
                countries.insert(country.to_string());
                if let Some(city) = agency.city_normalized.as_deref().filter(|c| !c.is_empty()) {
                    *cities.entry((country.to_string(), city.to_string())).or_default() += 1;
                }
            }
            if let Some(category) = agency.category_normalized.as_deref().filter(|c| !c.is_empty()) {
                categories.insert(category.to_string());
            }
        }

        for country in &countries {
            entries.extend(self.localized(
                &format!("/agencies/country/{}", path_segment(country)),
                self.today,
                ChangeFrequency::Daily,
                0.8,
                None,
            ));
        }

        let mut ranked_cities: Vec<_> = cities.into_iter().collect();
        ranked_cities.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for ((country, city), _) in ranked_cities.into_iter().take(MAX_CITY_PAGES) {
            entries.extend(self.localized(
                &format!(
                    "/agencies/country/{}/city/{}",
                    path_segment(&country),
                    path_segment(&city)
                ),
                self.today,
                ChangeFrequency::Daily,
                0.75,
                None,
            ));
        }

        for category in &categories {
            entries.extend(self.localized(
                &format!("/agencies/category/{}", path_segment(category)),
                self.today,
                ChangeFrequency::Weekly,
                0.7,
                None,
            ));
        }

        for agency in visible {
            let last_modified = agency.created_at.map_or(self.today, |c| c.date_naive());
            entries.extend(self.localized(
                &format!("/agencies/{}", agency.slug),
                last_modified,
                ChangeFrequency::Weekly,
                agency_priority(agency),
                agency.image_url.as_deref(),
            ));
        }

        entries
    }
}

#[derive(Serialize)]
struct XmlImage<'a> {
    #[serde(rename = "image:loc")]
    loc: &'a str,
}

#[derive(Serialize)]
struct XmlUrl<'a> {
    loc: &'a str,
    lastmod: String,
    changefreq: ChangeFrequency,
    priority: String,
    #[serde(rename = "image:image", skip_serializing_if = "Option::is_none")]
    image: Option<XmlImage<'a>>,
}

#[derive(Serialize)]
#[serde(rename = "urlset")]
struct XmlUrlSet<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@xmlns:image")]
    xmlns_image: &'static str,
    url: Vec<XmlUrl<'a>>,
}

/// Render entries as a sitemaps.org `urlset` document
pub fn render_xml(entries: &[SitemapEntry]) -> Result<String> {
    let set = XmlUrlSet {
        xmlns: "http://www.sitemaps.org/schemas/sitemap/0.9",
        xmlns_image: "http://www.google.com/schemas/sitemap-image/1.1",
        url: entries
            .iter()
            .map(|e| XmlUrl {
                loc: &e.url,
                lastmod: e.last_modified.to_string(),
                changefreq: e.change_frequency,
                priority: format!("{:.2}", e.priority),
                image: e.image.as_deref().map(|loc| XmlImage { loc }),
            })
            .collect(),
    };
    let body = quick_xml::se::to_string(&set)
        .map_err(|e| DirectoryError::general(format!("Failed to render sitemap: {e}")))?;
    Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{body}"))
}

/// robots.txt pointing crawlers at the sitemap and away from private areas
#[must_use]
pub fn robots_txt(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut out = String::new();
    for agent in ["*", "Googlebot", "Bingbot", "Yandex", "Baiduspider"] {
        out.push_str(&format!("User-agent: {agent}\nAllow: /\n"));
        for path in ["/api/", "/private/", "/admin/"] {
            out.push_str(&format!("Disallow: {path}\n"));
        }
        out.push('\n');
    }
    for agent in ["Googlebot-Image", "facebookexternalhit", "Twitterbot", "LinkedInBot"] {
        out.push_str(&format!("User-agent: {agent}\nAllow: /\n\n"));
    }
    out.push_str(&format!("Host: {base_url}\nSitemap: {base_url}/sitemap.xml\n"));
    out
}
