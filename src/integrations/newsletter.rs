//! Newsletter signups through the Brevo contacts API

use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::error::{IntegrationError, Result};
use crate::config::NewsletterConfig;

const SERVICE: &str = "Brevo";
const CONTACTS_URL: &str = "https://api.brevo.com/v3/contacts";
const SIGNUP_SOURCE: &str = "TravelAgencies.World Newsletter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Subscribed,
    AlreadySubscribed,
}

impl Subscription {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Subscribed => "Successfully subscribed!",
            Self::AlreadySubscribed => "You're already subscribed!",
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ContactAttributes {
    source: &'static str,
    signup_date: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateContact<'a> {
    email: &'a str,
    list_ids: [u32; 1],
    update_enabled: bool,
    attributes: ContactAttributes,
}

#[derive(Deserialize)]
struct BrevoError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct NewsletterClient {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    list_id: u32,
}

impl NewsletterClient {
    #[must_use]
    pub fn new(config: &NewsletterConfig, client: ClientWithMiddleware) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            list_id: config.list_id,
        }
    }

    /// Add `email` to the configured list. An existing contact counts as success.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, email: &str) -> Result<Subscription> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| IntegrationError::NotConfigured(SERVICE.to_string()))?;

        let body = serde_json::to_vec(&CreateContact {
            email,
            list_ids: [self.list_id],
            update_enabled: true,
            attributes: ContactAttributes {
                source: SIGNUP_SOURCE,
                signup_date: Utc::now().to_rfc3339(),
            },
        })
        .map_err(|e| IntegrationError::Parse(e.to_string()))?;

        let response = self
            .client
            .post(CONTACTS_URL)
            .header("Content-Type", "application/json")
            .header("api-key", api_key)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            info!("Newsletter contact created");
            return Ok(Subscription::Subscribed);
        }

        let text = response.text().await.unwrap_or_default();
        classify_failure(status, &text)
    }
}

fn classify_failure(status: u16, body: &str) -> Result<Subscription> {
    let parsed: Option<BrevoError> = serde_json::from_str(body).ok();
    if status == 400 {
        if let Some(error) = &parsed
            && error.code.as_deref() == Some("duplicate_parameter")
        {
            return Ok(Subscription::AlreadySubscribed);
        }
        let message = parsed
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Failed to subscribe".to_string());
        warn!("{SERVICE} rejected subscription: {message}");
        return Err(IntegrationError::Api { status, message });
    }
    Err(IntegrationError::from_status(SERVICE, status, body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_counts_as_subscribed() {
        let result = classify_failure(400, r#"{"code":"duplicate_parameter","message":"Contact already exist"}"#);
        assert_eq!(result.unwrap(), Subscription::AlreadySubscribed);
        assert_eq!(Subscription::AlreadySubscribed.message(), "You're already subscribed!");
    }

    #[test]
    fn test_other_bad_request_keeps_message() {
        let err = classify_failure(400, r#"{"code":"invalid_parameter","message":"email is not valid"}"#).unwrap_err();
        match err {
            IntegrationError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "email is not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_auth_failure() {
        let err = classify_failure(401, "unauthorized").unwrap_err();
        assert!(matches!(err, IntegrationError::Authentication(_)));
    }

    #[test]
    fn test_payload_shape() {
        let value = serde_json::to_value(CreateContact {
            email: "a@b.co",
            list_ids: [2],
            update_enabled: true,
            attributes: ContactAttributes {
                source: SIGNUP_SOURCE,
                signup_date: "2025-01-01T00:00:00+00:00".to_string(),
            },
        })
        .unwrap();
        assert_eq!(value["listIds"][0], 2);
        assert_eq!(value["updateEnabled"], true);
        assert_eq!(value["attributes"]["SOURCE"], SIGNUP_SOURCE);
        assert!(value["attributes"]["SIGNUP_DATE"].is_string());
    }
}
