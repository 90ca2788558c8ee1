//! Clients for third-party HTTP services

pub mod chat_completion;
pub mod error;
pub mod form_relay;
pub mod newsletter;
pub mod serp;

pub use chat_completion::{ChatCompletionClient, ChatMessage, ChatModel, Role, generate_description};
pub use error::IntegrationError;
pub use form_relay::{ContactMessage, ContactRelay};
pub use newsletter::{NewsletterClient, Subscription};
pub use serp::SerpApiClient;
