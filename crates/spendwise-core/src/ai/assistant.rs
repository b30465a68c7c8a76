//! Financial assistant: chat and narrative insights on top of an LLM backend

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::analytics::SpendingSummary;
use crate::error::{Error, Result};

use super::{
    AIBackend, AIClient, AiLimits, ChatMessage, CompletionOptions, ConversationStore, RequestGate,
    ResponseCache,
};

pub const FINBOT_SYSTEM_PROMPT: &str = "\
You are FinBot, a friendly personal finance assistant.

Your job:
1. Help the user track and manage daily income and spending
2. Give saving advice based on their habits
3. Answer personal finance questions
4. Help plan budgets

Rules:
- Keep answers short, clear and friendly
- Use a fitting emoji now and then
- Ask for details when a spending question is ambiguous
- Give advice that is practical and easy to act on

Example:
- User: \"How much should I spend on food this month?\"
- FinBot: \"Under the 50/30/20 rule about half of your income goes to needs, food included. \
On an income of 10,000 a month, 1,500 to 2,000 for food is reasonable. 🍜\"";

const ANALYST_SYSTEM_PROMPT: &str =
    "You are a personal finance analyst. Answer concisely and practically.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightNarrative {
    pub insights: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub cached: bool,
}

/// Shared by all requests; clones share the gate, cache and histories
#[derive(Clone)]
pub struct Assistant {
    client: AIClient,
    gate: Arc<RequestGate>,
    cache: Arc<ResponseCache>,
    conversations: Arc<ConversationStore>,
}

impl Assistant {
    pub fn new(client: AIClient, limits: AiLimits) -> Self {
        Self {
            client,
            cache: Arc::new(ResponseCache::new(limits.cache_ttl, limits.cache_max_entries)),
            conversations: Arc::new(ConversationStore::new(
                limits.conversation_ttl,
                limits.max_history,
                limits.max_conversations,
            )),
            gate: Arc::new(RequestGate::new(limits)),
        }
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn complete(&self, messages: &[ChatMessage], options: CompletionOptions) -> Result<String> {
        self.gate
            .run(|| self.client.complete(messages, &options))
            .await
    }

    /// Completion through the response cache
    async fn complete_cached(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> Result<(String, bool)> {
        let mut parts: Vec<&str> = vec![self.client.model()];
        parts.extend(messages.iter().map(|m| m.content.as_str()));
        let key = ResponseCache::key(&parts);

        if let Some(hit) = self.cache.get(&key) {
            debug!("LLM cache hit");
            return Ok((hit, true));
        }

        let response = self.complete(messages, options).await?;
        self.cache.insert(key, response.clone());
        Ok((response, false))
    }

    /// Send a chat message, continuing `conversation_id` when given
    pub async fn chat(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        message: &str,
    ) -> Result<ChatReply> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::InvalidData("Message is required".into()));
        }

        let conversation_id = conversation_id
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}", user_id, Utc::now().timestamp_millis()));

        let mut messages = vec![ChatMessage::system(FINBOT_SYSTEM_PROMPT)];
        messages.extend(self.conversations.history(user_id, &conversation_id));
        messages.push(ChatMessage::user(message));

        let reply = self
            .complete(
                &messages,
                CompletionOptions {
                    temperature: 0.7,
                    max_tokens: Some(1024),
                },
            )
            .await?;

        self.conversations.append(
            user_id,
            &conversation_id,
            [ChatMessage::user(message), ChatMessage::assistant(reply.clone())],
        );

        Ok(ChatReply {
            message: reply,
            conversation_id,
        })
    }

    /// Forget a conversation; returns whether it existed
    pub fn clear_conversation(&self, user_id: &str, conversation_id: &str) -> bool {
        self.conversations.clear(user_id, conversation_id)
    }

    /// Number of messages kept for a conversation
    pub fn history_len(&self, user_id: &str, conversation_id: &str) -> usize {
        self.conversations.history(user_id, conversation_id).len()
    }

    /// Short bullet-point commentary on a spending summary
    ///
    /// Commentary is optional: any backend failure is logged and yields None.
    pub async fn commentary(&self, summary: &SpendingSummary) -> Option<String> {
        let prompt = format!(
            "Give a short financial analysis in 3-4 bullet points:\n\
             - Income: {:.0}\n\
             - Spending: {:.0}\n\
             - Savings rate: {}%\n\
             - Top spending: {}\n\n\
             Comment on it and give 1-2 concrete suggestions.",
            summary.total_income,
            summary.total_expense,
            summary.savings_rate,
            top_names(summary),
        );
        let messages = [ChatMessage::system(ANALYST_SYSTEM_PROMPT), ChatMessage::user(prompt)];

        match self
            .complete_cached(
                &messages,
                CompletionOptions {
                    temperature: 0.7,
                    max_tokens: Some(300),
                },
            )
            .await
        {
            Ok((text, _)) => Some(text),
            Err(e) => {
                warn!(error = %e, "Spending commentary unavailable");
                None
            }
        }
    }

    /// One insight per line about a trailing-period summary
    pub async fn insights(&self, summary: &SpendingSummary) -> Result<InsightNarrative> {
        let categories = summary
            .top_expense_categories
            .iter()
            .map(|c| format!("- {}: {:.0}", c.name, c.amount))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Analyze this financial data and give 3-4 short, useful insights:\n\n\
             Total income: {:.0}\n\
             Total spending: {:.0}\n\
             Savings: {:.0} ({}%)\n\n\
             Top spending categories:\n{}\n\n\
             Transactions: {}\n\n\
             Requirements:\n\
             - Be specific, not generic\n\
             - Start each insight with a fitting emoji\n\
             - Suggest improvements where needed\n\
             - One insight per line",
            summary.total_income,
            summary.total_expense,
            summary.savings,
            summary.savings_rate,
            categories,
            summary.transaction_count,
        );
        let messages = [ChatMessage::system(ANALYST_SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let (text, cached) = self
            .complete_cached(
                &messages,
                CompletionOptions {
                    temperature: 0.7,
                    max_tokens: Some(500),
                },
            )
            .await?;

        Ok(InsightNarrative {
            insights: text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            generated_at: Utc::now(),
            cached,
        })
    }
}

fn top_names(summary: &SpendingSummary) -> String {
    if summary.top_expense_categories.is_empty() {
        return "none".to_string();
    }
    summary
        .top_expense_categories
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
