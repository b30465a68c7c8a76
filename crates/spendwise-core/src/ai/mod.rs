//! Pluggable LLM backend for narrative insights and chat
//!
//! The analytics engines never depend on this module. It only turns their
//! results into prose and answers free-form questions.
//!
//! # Architecture
//!
//! - `AIBackend` trait: chat completion over a message list
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - `RequestGate`: concurrency cap, per-minute window and retry with backoff
//! - `ResponseCache`: TTL cache of completions keyed by a content hash
//! - `ConversationStore`: per-conversation chat history with TTL
//! - `Assistant`: ties the above together for the server
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openai_compatible, mock). Default: openai_compatible
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod assistant;
mod cache;
mod conversation;
mod mock;
mod openai_compatible;
mod throttle;

pub use assistant::{Assistant, ChatReply, InsightNarrative, FINBOT_SYSTEM_PROMPT};
pub use cache::ResponseCache;
pub use conversation::ConversationStore;
pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use throttle::RequestGate;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling settings for one completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: Some(1024),
        }
    }
}

/// Limits for outbound LLM traffic and the in-memory stores
#[derive(Debug, Clone, PartialEq)]
pub struct AiLimits {
    pub max_concurrent: usize,
    pub requests_per_minute: usize,
    /// Length of the rate window (one minute outside tests)
    pub rate_window: Duration,
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter: Duration,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub conversation_ttl: Duration,
    pub max_history: usize,
    /// Live conversations kept before the stalest is evicted
    pub max_conversations: usize,
}

impl Default for AiLimits {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            requests_per_minute: 10,
            rate_window: Duration::from_secs(60),
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_jitter: Duration::from_millis(1000),
            cache_ttl: Duration::from_secs(5 * 60),
            cache_max_entries: 200,
            conversation_ttl: Duration::from_secs(60 * 60),
            max_history: 20,
            max_conversations: 500,
        }
    }
}

/// Trait implemented by every LLM backend
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Run a chat completion and return the assistant's text
    async fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
#[derive(Clone)]
pub enum AIClient {
    /// Any server implementing `/v1/chat/completions`
    OpenAICompatible(OpenAICompatibleBackend),
    /// Canned replies for tests and offline development
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from environment variables
    ///
    /// Returns None if the selected backend is not configured.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("AI_BACKEND").unwrap_or_else(|_| "openai_compatible".to_string());

        match backend.to_lowercase().as_str() {
            "openai_compatible" | "openai" | "groq" | "vllm" | "localai" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to openai_compatible");
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
        }
    }

    pub fn openai_compatible(host: &str, model: &str) -> Self {
        AIClient::OpenAICompatible(OpenAICompatibleBackend::new(host, model))
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl AIBackend for AIClient {
    async fn complete(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.complete(messages, options).await,
            AIClient::Mock(b) => b.complete(messages, options).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
