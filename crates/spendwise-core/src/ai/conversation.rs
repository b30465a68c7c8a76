//! In-memory chat histories

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::ChatMessage;

struct Conversation {
    messages: Vec<ChatMessage>,
    updated: Instant,
}

/// Owner and conversation id, kept apart so no pair of ids can collide
type Key = (String, String);

fn key(user_id: &str, conversation_id: &str) -> Key {
    (user_id.to_string(), conversation_id.to_string())
}

/// Chat histories keyed by user and conversation id
///
/// A conversation expires `ttl` after its last update. Histories are capped
/// at the most recent `max_messages` messages. When `max_conversations` are
/// live, starting a new one evicts the least recently updated.
pub struct ConversationStore {
    conversations: Mutex<HashMap<Key, Conversation>>,
    ttl: Duration,
    max_messages: usize,
    max_conversations: usize,
}

impl ConversationStore {
    pub fn new(ttl: Duration, max_messages: usize, max_conversations: usize) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            ttl,
            max_messages: max_messages.max(2),
            max_conversations: max_conversations.max(1),
        }
    }

    /// Current history; empty for unknown or expired conversations
    pub fn history(&self, user_id: &str, conversation_id: &str) -> Vec<ChatMessage> {
        let id = key(user_id, conversation_id);
        let mut conversations = self.conversations.lock().unwrap_or_else(|e| e.into_inner());
        match conversations.get(&id) {
            Some(c) if c.updated.elapsed() < self.ttl => c.messages.clone(),
            Some(_) => {
                conversations.remove(&id);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Append messages and trim to the most recent `max_messages`
    pub fn append(
        &self,
        user_id: &str,
        conversation_id: &str,
        messages: impl IntoIterator<Item = ChatMessage>,
    ) {
        let id = key(user_id, conversation_id);
        let mut conversations = self.conversations.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        conversations.retain(|_, c| c.updated.elapsed() < ttl);

        if !conversations.contains_key(&id) && conversations.len() >= self.max_conversations {
            let oldest = conversations
                .iter()
                .min_by_key(|(_, c)| c.updated)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                conversations.remove(&oldest);
            }
        }

        let conversation = conversations.entry(id).or_insert_with(|| Conversation {
            messages: Vec::new(),
            updated: Instant::now(),
        });
        conversation.messages.extend(messages);
        let excess = conversation.messages.len().saturating_sub(self.max_messages);
        conversation.messages.drain(..excess);
        conversation.updated = Instant::now();
    }

    /// Forget a conversation; returns whether it existed
    pub fn clear(&self, user_id: &str, conversation_id: &str) -> bool {
        self.conversations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key(user_id, conversation_id))
            .is_some()
    }

    /// Number of live conversations
    pub fn len(&self) -> usize {
        let ttl = self.ttl;
        self.conversations
            .lock()
            .map(|c| c.values().filter(|c| c.updated.elapsed() < ttl).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConversationStore {
        ConversationStore::new(Duration::from_secs(60), 20, 100)
    }

    #[test]
    fn test_append_and_history() {
        let store = store();
        store.append("u", "c1", [ChatMessage::user("hi"), ChatMessage::assistant("hello")]);
        let history = store.history("u", "c1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "hello");
        assert!(store.history("u", "c2").is_empty());
        assert!(store.history("other", "c1").is_empty());
    }

    #[test]
    fn test_ids_containing_separators_stay_distinct() {
        let store = store();
        store.append("alice:x", "y", [ChatMessage::user("secret")]);
        assert!(store.history("alice", "x:y").is_empty());
        assert!(!store.clear("alice", "x:y"));
        assert_eq!(store.history("alice:x", "y").len(), 1);
    }

    #[test]
    fn test_history_is_truncated_to_most_recent() {
        let store = store();
        for i in 0..15 {
            store.append(
                "u",
                "c1",
                [
                    ChatMessage::user(format!("q{}", i)),
                    ChatMessage::assistant(format!("a{}", i)),
                ],
            );
        }
        let history = store.history("u", "c1");
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].content, "q5");
        assert_eq!(history[19].content, "a14");
    }

    #[test]
    fn test_conversations_expire() {
        let store = ConversationStore::new(Duration::from_millis(20), 20, 100);
        store.append("u", "c1", [ChatMessage::user("hi")]);
        std::thread::sleep(Duration::from_millis(40));
        assert!(store.history("u", "c1").is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_least_recently_updated_evicted_when_full() {
        let store = ConversationStore::new(Duration::from_secs(60), 20, 2);
        store.append("u", "a", [ChatMessage::user("1")]);
        std::thread::sleep(Duration::from_millis(2));
        store.append("u", "b", [ChatMessage::user("2")]);
        std::thread::sleep(Duration::from_millis(2));
        // Touching "a" makes "b" the stalest
        store.append("u", "a", [ChatMessage::user("3")]);
        std::thread::sleep(Duration::from_millis(2));
        store.append("u", "c", [ChatMessage::user("4")]);

        assert_eq!(store.len(), 2);
        assert!(store.history("u", "b").is_empty());
        assert_eq!(store.history("u", "a").len(), 2);
        assert_eq!(store.history("u", "c").len(), 1);
    }

    #[test]
    fn test_many_distinct_conversations_stay_bounded() {
        let store = ConversationStore::new(Duration::from_secs(60), 20, 50);
        for i in 0..500 {
            store.append("u", &format!("c{}", i), [ChatMessage::user("hi")]);
        }
        assert_eq!(store.len(), 50);
    }

    #[test]
    fn test_clear() {
        let store = store();
        store.append("u", "c1", [ChatMessage::user("hi")]);
        assert!(store.clear("u", "c1"));
        assert!(!store.clear("u", "c1"));
        assert!(store.history("u", "c1").is_empty());
    }
}
