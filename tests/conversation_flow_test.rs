//! End-to-end tests for the conversation history flow

use ragchat::conversation::sanitize_conv_id;
use ragchat::conversation::ChatMessage;
use ragchat::conversation::ChatRole;
use ragchat::conversation::ConversationStore;
use ragchat::llm::prompts;

/// A full chat session: the request handler appends a question and an
/// answer per turn, and the bound holds after every turn.
#[test]
fn test_chat_session_eviction_scenario() {
    let store = ConversationStore::new(4);
    let conv_id = sanitize_conv_id("session-42");

    let turns = [
        ("hi", "hello"),
        ("how are you", "good"),
    ];

    for (question, answer) in turns {
        store.add_message(&conv_id, ChatMessage::user(question));
        store.add_message(&conv_id, ChatMessage::assistant(answer));
        assert!(store.get_history(&conv_id).len() <= 4);
    }

    store.add_message(&conv_id, ChatMessage::user("bye"));

    let history = store.get_history(&conv_id);
    let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hello", "how are you", "good", "bye"]);
    assert_eq!(history[0].role, ChatRole::Assistant);
    assert_eq!(history[3].role, ChatRole::User);
}

/// History snapshots feed prompt assembly without touching store state
#[test]
fn test_history_snapshot_feeds_prompts() {
    let store = ConversationStore::new(10);

    store.add_message("conv", ChatMessage::user("What is a vector index?"));
    store.add_message("conv", ChatMessage::assistant("An index over embeddings."));

    let history = store.get_history("conv");
    let messages = prompts::answer_messages("some context", &history, "How is it built?");

    // system + two history turns + the new question
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1].role, "user");
    assert_eq!(messages[2].role, "assistant");
    assert_eq!(messages[3].content, "How is it built?");

    // Prompt assembly must not have consumed or mutated the stored history
    assert_eq!(store.get_history("conv").len(), 2);
}

/// Sanitized ids from hostile input still address a working conversation
#[test]
fn test_sanitized_id_round_trip() {
    let store = ConversationStore::new(10);

    let raw = "conv;001<script>";
    let conv_id = sanitize_conv_id(raw);
    assert_eq!(conv_id, "conv001script");

    store.add_message(&conv_id, ChatMessage::user("hello"));
    assert_eq!(store.get_history("conv001script").len(), 1);

    // The raw, unsanitized form addresses nothing
    assert!(store.get_history(raw).is_empty());
}

/// Deleting a conversation resets it completely for later reuse
#[test]
fn test_delete_and_recreate() {
    let store = ConversationStore::new(3);

    store.add_message("conv", ChatMessage::user("one"));
    store.add_message("conv", ChatMessage::assistant("two"));
    assert_eq!(store.conversation_count(), 1);

    assert!(store.clear_conversation("conv"));
    assert_eq!(store.conversation_count(), 0);
    assert!(!store.clear_conversation("conv"));

    store.add_message("conv", ChatMessage::user("fresh start"));
    let history = store.get_history("conv");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "fresh start");
}
