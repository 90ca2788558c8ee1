//! Agency directory record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GeoPoint;

/// Moderation state shared by agencies and access requests
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

/// A travel agency as stored in the `agencies` table
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Agency {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub slug: String,
    pub title: String,
    /// Category as scraped, possibly Arabic or French
    pub category_name: Option<String>,
    /// English category, trimmed and lower-cased
    pub category_normalized: Option<String>,
    pub description: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub city_normalized: Option<String>,
    pub state: Option<String>,
    /// ISO 3166-1 alpha-2
    pub country_code: Option<String>,
    pub country_normalized: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Google Maps place URL
    pub url: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
    pub total_score: Option<f64>,
    pub reviews_count: Option<i64>,
    pub owner_id: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Agency {
    /// Listed publicly: approved and not soft-deleted
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.status == ReviewStatus::Approved && self.deleted_at.is_none()
    }

    #[must_use]
    pub fn has_website(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.trim().is_empty())
    }

    /// Stored coordinates, when both columns hold an in-range value
    #[must_use]
    pub fn stored_point(&self) -> Option<GeoPoint> {
        GeoPoint::checked(self.latitude?, self.longitude?)
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.total_score.unwrap_or(0.0)
    }
}
