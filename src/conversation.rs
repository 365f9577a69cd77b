//! Bounded per-conversation chat history

use dashmap::DashMap;
use serde::Deserialize;
use serde::Serialize;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Wire-format name used by chat completion APIs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Chat message in conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// In-memory store of per-conversation message logs.
///
/// Each log is bounded to `max_messages` entries; appending beyond the bound
/// evicts the oldest messages first. Logs are created lazily on first append
/// and removed wholesale by [`ConversationStore::clear_conversation`].
/// Append and eviction for one conversation run under a single map entry
/// guard, so concurrent requests on the same id cannot leave a log over the
/// bound or reorder its messages.
pub struct ConversationStore {
    conversations: DashMap<String, Vec<ChatMessage>>,
    max_messages: usize,
}

impl ConversationStore {
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        Self {
            conversations: DashMap::new(),
            max_messages,
        }
    }

    /// Return a snapshot of the history for `conv_id`, oldest first.
    ///
    /// Unknown ids yield an empty history; this is not an error. The
    /// returned messages are clones, so callers cannot mutate store state
    /// through them.
    #[must_use]
    pub fn get_history(&self, conv_id: &str) -> Vec<ChatMessage> {
        self.conversations
            .get(conv_id)
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Append a message to the log for `conv_id`, creating it if absent.
    ///
    /// After the append, the oldest messages are evicted until the log is
    /// back within the bound. Other conversations are unaffected.
    pub fn add_message(&self, conv_id: &str, message: ChatMessage) {
        let mut log = self.conversations.entry(conv_id.to_string()).or_default();
        log.push(message);

        // Remove oldest messages if the limit is exceeded
        while log.len() > self.max_messages {
            tracing::debug!("Removing old msg from conversation id: {}", conv_id);
            log.remove(0);
        }
    }

    /// Remove the conversation entirely, key included.
    ///
    /// Returns whether the conversation existed; removing an unknown id is
    /// a no-op, not an error.
    pub fn clear_conversation(&self, conv_id: &str) -> bool {
        self.conversations.remove(conv_id).is_some()
    }

    /// Number of conversations not yet deleted
    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    #[must_use]
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}

/// Sanitize a caller-supplied conversation id for use as a store key.
///
/// Keeps letters, digits, `.`, `_` and `-`; strips everything else rather
/// than rejecting the request. Idempotent on already clean ids.
#[must_use]
pub fn sanitize_conv_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_id_returns_empty() {
        let store = ConversationStore::new(10);
        assert!(store.get_history("nonexistent").is_empty());
    }

    #[test]
    fn test_bound_holds_after_every_append() {
        let store = ConversationStore::new(3);

        for i in 0..25 {
            store.add_message("conv", ChatMessage::user(format!("Message {i}")));
            assert!(store.get_history("conv").len() <= 3);
        }
    }

    #[test]
    fn test_fifo_eviction() {
        let store = ConversationStore::new(2);

        store.add_message("conv", ChatMessage::user("A"));
        store.add_message("conv", ChatMessage::user("B"));
        store.add_message("conv", ChatMessage::user("C"));

        let history = store.get_history("conv");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "B");
        assert_eq!(history[1].content, "C");
    }

    #[test]
    fn test_eviction_ignores_role() {
        let store = ConversationStore::new(4);

        store.add_message("conv", ChatMessage::user("hi"));
        store.add_message("conv", ChatMessage::assistant("hello"));
        store.add_message("conv", ChatMessage::user("how are you"));
        store.add_message("conv", ChatMessage::assistant("good"));
        store.add_message("conv", ChatMessage::user("bye"));

        let history = store.get_history("conv");
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, ChatRole::Assistant);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].content, "how are you");
        assert_eq!(history[2].content, "good");
        assert_eq!(history[3].content, "bye");
    }

    #[test]
    fn test_per_id_isolation() {
        let store = ConversationStore::new(2);

        store.add_message("x", ChatMessage::user("only for x"));
        assert!(store.get_history("y").is_empty());

        store.add_message("y", ChatMessage::user("only for y"));
        assert_eq!(store.get_history("x").len(), 1);
        assert_eq!(store.get_history("x")[0].content, "only for x");
    }

    #[test]
    fn test_clear_removes_key_not_just_contents() {
        let store = ConversationStore::new(5);

        store.add_message("conv", ChatMessage::user("first"));
        store.add_message("conv", ChatMessage::assistant("second"));
        assert!(store.clear_conversation("conv"));
        assert_eq!(store.conversation_count(), 0);

        store.add_message("conv", ChatMessage::user("fresh"));
        let history = store.get_history("conv");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "fresh");
    }

    #[test]
    fn test_clear_unknown_is_noop() {
        let store = ConversationStore::new(5);
        assert!(!store.clear_conversation("nonexistent"));
    }

    #[test]
    fn test_conversation_count() {
        let store = ConversationStore::new(5);
        assert_eq!(store.conversation_count(), 0);

        store.add_message("a", ChatMessage::user("hi"));
        store.add_message("b", ChatMessage::user("hi"));
        assert_eq!(store.conversation_count(), 2);

        store.clear_conversation("a");
        assert_eq!(store.conversation_count(), 1);
    }

    #[test]
    fn test_zero_bound_keeps_log_empty() {
        let store = ConversationStore::new(0);

        store.add_message("conv", ChatMessage::user("dropped"));
        store.add_message("conv", ChatMessage::assistant("also dropped"));

        assert!(store.get_history("conv").is_empty());
        // The key itself still exists until cleared
        assert_eq!(store.conversation_count(), 1);
    }

    #[test]
    fn test_snapshot_does_not_alias_store() {
        let store = ConversationStore::new(5);
        store.add_message("conv", ChatMessage::user("original"));

        let mut snapshot = store.get_history("conv");
        snapshot.push(ChatMessage::assistant("injected"));
        snapshot[0].content = "mutated".to_string();

        let history = store.get_history("conv");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "original");
    }

    #[test]
    fn test_concurrent_appends_respect_bound() {
        use std::sync::Arc;

        let store = Arc::new(ConversationStore::new(8));
        let mut handles = Vec::new();

        for t in 0..4 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    store.add_message("shared", ChatMessage::user(format!("{t}-{i}")));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_history("shared").len(), 8);
    }

    #[test]
    fn test_sanitize_clean_id_unchanged() {
        assert_eq!(sanitize_conv_id("conv-001"), "conv-001");
        assert_eq!(sanitize_conv_id("user_1.session-2"), "user_1.session-2");
    }

    #[test]
    fn test_sanitize_strips_disallowed_chars() {
        assert_eq!(sanitize_conv_id("conv;001<script>"), "conv001script");
        assert_eq!(sanitize_conv_id("a/b\\c d'e\"f"), "abcdef");
    }

    #[test]
    fn test_sanitize_all_invalid_becomes_empty() {
        assert_eq!(sanitize_conv_id(";<>&|"), "");
    }
}
