use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::{IntegrationError, Result};
use crate::config::{ChatConfig, OpenAiConfig};

const AZURE_API_VERSION: &str = "2024-05-01-preview";
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.7;

const COPYWRITER_PROMPT: &str = "You are an expert copywriter for a global travel directory. \
Write engaging, trustworthy and concise descriptions for travel agencies.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A model that answers a list of chat messages
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// `Ok(None)` when the model returned no content
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>>;

    /// Whether credentials are present; `complete` fails with `NotConfigured` otherwise
    fn is_configured(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Clone)]
enum Credentials {
    /// `Authorization: Bearer` (OpenAI)
    Bearer(String),
    /// `api-key` header (Azure)
    ApiKey(String),
}

/// Chat completions client for either OpenAI or an Azure deployment
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: ClientWithMiddleware,
    service: &'static str,
    url: Option<String>,
    credentials: Option<Credentials>,
    model: Option<String>,
}

impl ChatCompletionClient {
    #[must_use]
    pub fn openai(config: &OpenAiConfig, client: ClientWithMiddleware) -> Self {
        Self {
            client,
            service: "OpenAI",
            url: Some(format!("{}/chat/completions", config.base_url.trim_end_matches('/'))),
            credentials: config.api_key.clone().map(Credentials::Bearer),
            model: Some(config.model.clone()),
        }
    }

    #[must_use]
    pub fn azure(config: &ChatConfig, client: ClientWithMiddleware) -> Self {
        Self {
            client,
            service: "Azure OpenAI",
            url: config.endpoint.as_ref().map(|endpoint| {
                format!(
                    "{}/models/chat/completions?api-version={AZURE_API_VERSION}",
                    endpoint.trim_end_matches('/')
                )
            }),
            credentials: config.api_key.clone().map(Credentials::ApiKey),
            model: None,
        }
    }
}

#[async_trait]
impl ChatModel for ChatCompletionClient {
    #[instrument(skip(self, messages), fields(service = self.service, messages = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>> {
        let (Some(url), Some(credentials)) = (&self.url, &self.credentials) else {
            return Err(IntegrationError::NotConfigured(self.service.to_string()));
        };

        let body = serde_json::to_vec(&CompletionRequest {
            model: self.model.as_deref(),
            messages,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        })
        .map_err(|e| IntegrationError::Parse(e.to_string()))?;

        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body);
        let request = match credentials {
            Credentials::Bearer(key) => request.header("Authorization", format!("Bearer {key}")),
            Credentials::ApiKey(key) => request.header("api-key", key.as_str()),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::from_status(self.service, status, body));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| IntegrationError::Parse(format!("Failed to parse {} response: {e}", self.service)))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty());
        debug!("{} returned content: {}", self.service, content.is_some());
        Ok(content)
    }

    fn is_configured(&self) -> bool {
        self.url.is_some() && self.credentials.is_some()
    }
}

/// Prompt asking for a short marketing description of an agency
#[must_use]
pub fn description_prompt(title: &str, category: &str, location: Option<&str>) -> String {
    let location = location.filter(|l| !l.trim().is_empty()).unwrap_or("Global");
    format!(
        "Write a professional and engaging description for a travel agency named \"{title}\". \
It is a {category} located in {location}. \
Keep it to 3-4 sentences, highlight the services travelers can expect, \
and mention that it is a verified partner on TravelAgencies.World."
    )
}

/// Generate an agency description with the copywriter persona
pub async fn generate_description(
    model: &dyn ChatModel,
    title: &str,
    category: &str,
    location: Option<&str>,
) -> Result<Option<String>> {
    let messages = [
        ChatMessage::system(COPYWRITER_PROMPT),
        ChatMessage::user(description_prompt(title, category, location)),
    ];
    model.complete(&messages).await
}
