//! Bulk import of scraped agency listings

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::directory::DirectoryStore;
use crate::geo::{canonical_city_name, country_name};
use crate::models::{Agency, GeoPoint, ReviewStatus};
use crate::text::{contains_arabic, english_category, normalize, slugify};
use crate::{DirectoryError, Result};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawLocation {
    pub lat: f64,
    pub lng: f64,
}

/// One listing as exported by the Maps scraper
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAgency {
    pub title: Option<String>,
    pub total_score: Option<f64>,
    pub reviews_count: Option<i64>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country_code: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub category_name: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub location: Option<RawLocation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub read: usize,
    pub prepared: usize,
    pub inserted: usize,
    pub failed_batches: usize,
}

pub async fn read_export(path: impl AsRef<Path>) -> Result<Vec<RawAgency>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw)
        .map_err(|e| DirectoryError::validation(format!("Invalid export {}: {e}", path.display())))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Convert export rows to agency records. Rows without a title or with an
/// Arabic-script title are skipped; the row index keeps slugs unique.
#[must_use]
pub fn prepare_agencies(rows: &[RawAgency]) -> Vec<Agency> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let title = non_empty(row.title.as_ref())?;
            if contains_arabic(&title) {
                return None;
            }

            let base = slugify(&title);
            let base = if base.is_empty() { format!("agency-{index}") } else { base };
            let category = english_category(row.category_name.as_deref());
            let city = non_empty(row.city.as_ref());
            let country_code = non_empty(row.country_code.as_ref()).map(|c| c.to_uppercase());
            let point = row
                .location
                .and_then(|l| GeoPoint::checked(l.lat, l.lng));

            Some(Agency {
                slug: format!("{base}-{index}"),
                description: Some(format!(
                    "Welcome to {title}, a premier {category} in {}.",
                    city.as_deref().unwrap_or("your area")
                )),
                title,
                category_name: non_empty(row.category_name.as_ref()),
                category_normalized: Some(normalize(&category)),
                street: non_empty(row.street.as_ref()),
                city_normalized: city.as_deref().map(|c| normalize(&canonical_city_name(c))),
                city,
                state: non_empty(row.state.as_ref()),
                country_normalized: country_code.as_deref().map(|c| normalize(&country_name(c))),
                country_code,
                latitude: point.map(|p| p.lat),
                longitude: point.map(|p| p.lng),
                url: non_empty(row.url.as_ref()),
                phone: non_empty(row.phone.as_ref()),
                website: non_empty(row.website.as_ref()),
                image_url: non_empty(row.image_url.as_ref()),
                total_score: row.total_score,
                reviews_count: row.reviews_count,
                featured: false,
                status: ReviewStatus::Approved,
                ..Agency::default()
            })
        })
        .collect()
}

/// Insert in batches of `batch_size`. A failed batch is logged and skipped;
/// `on_batch` is called after every successful one.
pub async fn insert_batches(
    store: &dyn DirectoryStore,
    agencies: &[Agency],
    batch_size: usize,
    mut on_batch: impl FnMut(usize),
) -> SeedReport {
    let mut report = SeedReport {
        prepared: agencies.len(),
        ..SeedReport::default()
    };

    for (index, chunk) in agencies.chunks(batch_size.max(1)).enumerate() {
        match store.insert_agencies(chunk).await {
            Ok(inserted) => {
                report.inserted += inserted.len();
                on_batch(index);
            }
            Err(e) => {
                report.failed_batches += 1;
                error!("Error inserting batch {index}: {e}");
            }
        }
    }
    report
}

/// Read, prepare and insert an export file
pub async fn seed_from_file(
    store: &dyn DirectoryStore,
    path: impl AsRef<Path>,
    batch_size: usize,
    on_batch: impl FnMut(usize),
) -> Result<SeedReport> {
    let rows = read_export(path).await?;
    info!("Read {} records", rows.len());

    let agencies = prepare_agencies(&rows);
    if agencies.len() < rows.len() {
        warn!("Skipped {} rows without a usable title", rows.len() - agencies.len());
    }
    info!("Prepared {} agencies for insertion", agencies.len());

    let mut report = insert_batches(store, &agencies, batch_size, on_batch).await;
    report.read = rows.len();
    Ok(report)
}
