//! Agency-owned sub-records, ownership claims and user profiles

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ReviewStatus;

/// A service an agency offers (visa help, airport transfer, ...)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Service {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub agency_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Icon identifier understood by the frontend
    pub icon: Option<String>,
}

/// A bookable experience published by an agency
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Experience {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub agency_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub duration: Option<String>,
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A user's claim to manage an agency
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AccessRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub agency_id: String,
    pub user_id: String,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Profile {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}
