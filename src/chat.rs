//! Session-scoped chat assistant
//!
//! A session is opened with an optional agency context, accumulates the
//! conversation and is dropped on close or when its TTL lapses. Sessions
//! live in the persistent cache so a restart does not lose them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cache::PersistentCache;
use crate::config::ChatConfig;
use crate::integrations::{ChatMessage, ChatModel, IntegrationError};
use crate::{DirectoryError, Result};

const SESSION_PREFIX: &str = "chat-session:";
const FALLBACK_REPLY: &str = "Sorry, I couldn't process that.";
const MAX_MESSAGE_CHARS: usize = 2000;

const SYSTEM_PROMPT: &str = "You are a helpful travel assistant for TravelAgencies.World, \
a worldwide directory of verified travel agencies.

Your role is to:
- Help users find travel agencies for their trips
- Answer questions about travel destinations
- Provide tips about Morocco, CAN 2025 and popular travel destinations
- Guide users to the website features (search, filter by country, ratings)
- Be friendly, concise and helpful

Key information:
- Users can filter agencies by country, city, category and rating
- Agency listings are free and promotion packages are available

To add an agency to the platform:
- Contact us on WhatsApp: +33 7 45 07 56 68
- Or email: contact@travelagencies.world
- Always give these contact details when someone asks about listing their business

Keep responses short (2-3 sentences) unless the user asks for details.
Respond in the same language the user writes in (French, English, Arabic, etc.).";

/// Agency the visitor is looking at when the chat is opened
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgencyContext {
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub services: Vec<String>,
    pub experiences: Vec<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

impl AgencyContext {
    fn prompt(&self) -> String {
        let mut lines = vec![format!("The user is viewing the agency \"{}\".", self.name)];
        let location = [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        if !location.is_empty() {
            lines.push(format!("Location: {}", location.join(", ")));
        }
        if !self.services.is_empty() {
            lines.push(format!("Services: {}", self.services.join(", ")));
        }
        if !self.experiences.is_empty() {
            lines.push(format!("Experiences: {}", self.experiences.join(", ")));
        }
        for (label, value) in [
            ("Phone", &self.phone),
            ("Email", &self.email),
            ("Website", &self.website),
        ] {
            if let Some(value) = value {
                lines.push(format!("{label}: {value}"));
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: String,
    pub context: Option<AgencyContext>,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    /// System prompt, agency context, then the most recent `window` messages
    fn prompt_messages(&self, window: usize) -> Vec<ChatMessage> {
        let mut system = SYSTEM_PROMPT.to_string();
        if let Some(context) = &self.context {
            system.push_str("\n\n");
            system.push_str(&context.prompt());
        }
        let skip = self.messages.len().saturating_sub(window);
        std::iter::once(ChatMessage::system(system))
            .chain(self.messages.iter().skip(skip).cloned())
            .collect()
    }
}

#[derive(Clone)]
pub struct ChatSessionStore {
    cache: PersistentCache,
    model: Arc<dyn ChatModel>,
    ttl: Duration,
    history_window: usize,
}

fn session_key(id: &str) -> String {
    format!("{SESSION_PREFIX}{id}")
}

impl ChatSessionStore {
    pub fn new(cache: PersistentCache, model: Arc<dyn ChatModel>, config: &ChatConfig) -> Self {
        Self {
            cache,
            model,
            ttl: Duration::from_secs(u64::from(config.session_ttl_minutes) * 60),
            history_window: config.history_window as usize,
        }
    }

    async fn save(&self, session: &ChatSession) -> Result<()> {
        self.cache
            .put_json(&session_key(&session.id), session, self.ttl)
            .await
            .map_err(|e| DirectoryError::cache(e.to_string()))
    }

    pub async fn session(&self, id: &str) -> Result<ChatSession> {
        self.cache
            .get_json(&session_key(id))
            .await
            .map_err(|e| DirectoryError::cache(e.to_string()))?
            .ok_or_else(|| DirectoryError::not_found("Chat session not found or expired"))
    }

    pub async fn open(&self, context: Option<AgencyContext>) -> Result<ChatSession> {
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            context: context.filter(|c| !c.name.trim().is_empty()),
            messages: Vec::new(),
            created_at: Utc::now(),
        };
        self.save(&session).await?;
        info!("Opened chat session {}", session.id);
        Ok(session)
    }

    /// Add the user's message, ask the model and record its reply
    #[instrument(skip(self, text))]
    pub async fn send(&self, id: &str, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DirectoryError::validation("Message must not be empty"));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(DirectoryError::validation(format!(
                "Message is limited to {MAX_MESSAGE_CHARS} characters"
            )));
        }

        let mut session = self.session(id).await?;
        session.messages.push(ChatMessage::user(text));

        let reply = match self.model.complete(&session.prompt_messages(self.history_window)).await {
            Ok(content) => content.unwrap_or_else(|| FALLBACK_REPLY.to_string()),
            Err(IntegrationError::NotConfigured(service)) => {
                warn!("{service} credentials are not set");
                return Err(DirectoryError::config("Chat service is not configured."));
            }
            Err(e) => return Err(e.into()),
        };

        session.messages.push(ChatMessage::assistant(reply.clone()));
        self.save(&session).await?;
        Ok(reply)
    }

    pub async fn close(&self, id: &str) -> Result<()> {
        self.cache
            .remove(&session_key(id))
            .await
            .map_err(|e| DirectoryError::cache(e.to_string()))?;
        info!("Closed chat session {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::Role;
    use crate::integrations::error::Result as IntegrationResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the last user message and records what it was sent
    #[derive(Default)]
    struct EchoModel {
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, messages: &[ChatMessage]) -> IntegrationResult<Option<String>> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok((!last.is_empty()).then(|| format!("echo: {last}")))
        }
    }

    struct Unconfigured;

    #[async_trait]
    impl ChatModel for Unconfigured {
        async fn complete(&self, _messages: &[ChatMessage]) -> IntegrationResult<Option<String>> {
            Err(IntegrationError::NotConfigured("Azure OpenAI".to_string()))
        }
    }

    fn cache() -> PersistentCache {
        let dir = std::env::temp_dir().join(format!("travel-directory-chat-{}", Uuid::new_v4()));
        PersistentCache::open(dir).unwrap()
    }

    fn config(window: u32) -> ChatConfig {
        ChatConfig {
            history_window: window,
            ..ChatConfig::default()
        }
    }

    #[tokio::test]
    async fn test_conversation_round_trip() {
        let model = Arc::new(EchoModel::default());
        let store = ChatSessionStore::new(cache(), model.clone(), &config(10));

        let context = AgencyContext {
            name: "Atlas Voyages".to_string(),
            city: Some("Fez".to_string()),
            services: vec!["Desert tours".to_string()],
            phone: Some("+212 5 00 00 00".to_string()),
            ..AgencyContext::default()
        };
        let session = store.open(Some(context)).await.unwrap();

        let reply = store.send(&session.id, "  Do you organize tours?  ").await.unwrap();
        assert_eq!(reply, "echo: Do you organize tours?");

        let stored = store.session(&session.id).await.unwrap();
        assert_eq!(stored.messages.len(), 2);
        assert_eq!(stored.messages[1].role, Role::Assistant);
        assert_eq!(stored.messages.iter().filter(|m| m.role == Role::User).count(), 1);

        let sent = model.seen.lock().unwrap()[0].clone();
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[0].content.contains("Atlas Voyages"));
        assert!(sent[0].content.contains("Services: Desert tours"));
        assert!(sent[0].content.contains("Phone: +212 5 00 00 00"));
    }

    #[tokio::test]
    async fn test_history_window_limits_prompt() {
        let model = Arc::new(EchoModel::default());
        let store = ChatSessionStore::new(cache(), model.clone(), &config(3));
        let session = store.open(None).await.unwrap();

        for i in 0..4 {
            store.send(&session.id, &format!("question {i}")).await.unwrap();
        }

        let seen = model.seen.lock().unwrap();
        let last = seen.last().unwrap();
        assert_eq!(last.len(), 4);
        assert!(!last[0].content.contains("viewing the agency"));
        assert_eq!(last[3].content, "question 3");
    }

    #[tokio::test]
    async fn test_close_removes_session() {
        let store = ChatSessionStore::new(cache(), Arc::new(EchoModel::default()), &config(10));
        let session = store.open(None).await.unwrap();
        store.close(&session.id).await.unwrap();

        let err = store.send(&session.id, "hello").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_validation_and_unconfigured_model() {
        let store = ChatSessionStore::new(cache(), Arc::new(Unconfigured), &config(10));
        let session = store.open(None).await.unwrap();

        let err = store.send(&session.id, "   ").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation { .. }));

        let err = store.send(&session.id, "hello").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Config { .. }));
        assert_eq!(store.session(&session.id).await.unwrap().messages.len(), 0);
    }
}
