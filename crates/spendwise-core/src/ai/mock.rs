//! Mock backend for testing
//!
//! Returns canned replies without any network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::{AIBackend, ChatMessage, CompletionOptions, Role};

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Fixed reply; when unset the last user message is echoed back
    pub reply: Option<String>,
    /// Fail every call with this HTTP status
    pub fail_status: Option<u16>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self::default()
    }

    pub fn with_reply(reply: &str) -> Self {
        Self {
            healthy: true,
            reply: Some(reply.to_string()),
            ..Default::default()
        }
    }

    /// A backend whose every call fails with `status`
    pub fn failing(status: u16) -> Self {
        Self {
            healthy: true,
            fail_status: Some(status),
            ..Default::default()
        }
    }

    /// Completions requested so far (shared between clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn complete(&self, messages: &[ChatMessage], _options: &CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self.fail_status {
            return Err(Error::Ai {
                status,
                message: "mock failure".into(),
            });
        }

        if let Some(ref reply) = self.reply {
            return Ok(reply.clone());
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("");
        Ok(format!("Mock reply to: {}", last_user))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoes_last_user_message() {
        let backend = MockBackend::new();
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("first"),
            ChatMessage::assistant("ok"),
            ChatMessage::user("second"),
        ];
        let reply = backend
            .complete(&messages, &CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "Mock reply to: second");
    }

    #[tokio::test]
    async fn test_failing_counts_calls() {
        let backend = MockBackend::failing(503);
        let clone = backend.clone();
        let err = clone
            .complete(&[], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unhealthy() {
        assert!(!MockBackend::unhealthy().health_check().await);
        assert!(MockBackend::new().health_check().await);
    }
}
