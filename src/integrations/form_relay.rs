//! Contact form relay to a web3forms-compatible endpoint

use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{info, instrument};

use super::error::{IntegrationError, Result};
use crate::DirectoryError;
use crate::config::ContactConfig;

const SERVICE: &str = "web3forms";
const FROM_NAME: &str = "TravelAgencies.World Contact Form";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    pub fn validate(&self) -> crate::Result<()> {
        let missing = [
            ("name", &self.name),
            ("email", &self.email),
            ("subject", &self.subject),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect::<Vec<_>>();

        if !missing.is_empty() {
            return Err(DirectoryError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        if !self.email.contains('@') {
            return Err(DirectoryError::validation("Invalid email address"));
        }
        Ok(())
    }

    fn form_fields<'a>(&'a self, access_key: &'a str) -> Vec<(&'static str, String)> {
        vec![
            ("access_key", access_key.to_string()),
            ("name", self.name.trim().to_string()),
            ("email", self.email.trim().to_string()),
            ("subject", format!("🌍 TravelAgencies.World - {}", self.subject.trim())),
            ("message", self.message.trim().to_string()),
            ("from_name", FROM_NAME.to_string()),
        ]
    }
}

#[derive(Deserialize)]
struct RelayResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct ContactRelay {
    client: ClientWithMiddleware,
    endpoint: String,
    access_key: Option<String>,
}

impl ContactRelay {
    #[must_use]
    pub fn new(config: &ContactConfig, client: ClientWithMiddleware) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            access_key: config.access_key.clone(),
        }
    }

    #[instrument(skip(self, message), fields(subject = %message.subject))]
    pub async fn send(&self, message: &ContactMessage) -> Result<()> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or_else(|| IntegrationError::NotConfigured(SERVICE.to_string()))?;

        let body = message
            .form_fields(access_key)
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let parsed: Option<RelayResponse> = serde_json::from_str(&text).ok();

        match parsed {
            Some(relay) if relay.success => {
                info!("Contact message relayed");
                Ok(())
            }
            Some(relay) => Err(IntegrationError::Api {
                status,
                message: format!("{SERVICE}: {}", relay.message),
            }),
            None => Err(IntegrationError::from_status(SERVICE, status, text)),
        }
    }
}
