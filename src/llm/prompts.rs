//! Prompt assembly for the chat RAG flow

use super::PromptMessage;
use crate::conversation::ChatMessage;

/// System prompt for rewriting a follow-up question as a standalone one
const CONTEXTUALIZE_SYSTEM_PROMPT: &str = "Given a chat history and the latest user question \
which might reference context in the chat history, formulate a standalone question which can \
be understood without the chat history. Do NOT answer the question, just reformulate it if \
needed and otherwise return it as is.";

/// Build the messages asking the model to condense a follow-up question
#[must_use]
pub fn contextualize_messages(history: &[ChatMessage], question: &str) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(CONTEXTUALIZE_SYSTEM_PROMPT));
    messages.extend(history.iter().map(PromptMessage::from));
    messages.push(PromptMessage::user(question));
    messages
}

/// Build the question-answering messages with retrieved context stuffed
/// into the system prompt
#[must_use]
pub fn answer_messages(context: &str, history: &[ChatMessage], question: &str) -> Vec<PromptMessage> {
    let system = format!(
        r"You are an assistant for question-answering tasks. Use the following pieces of retrieved context to answer the question. If you don't know the answer, say that you don't know. Keep the answer concise.

Context:
{context}"
    );

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(PromptMessage::system(system));
    messages.extend(history.iter().map(PromptMessage::from));
    messages.push(PromptMessage::user(question));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contextualize_interleaves_history() {
        let history = vec![
            ChatMessage::user("What is Oracle 23ai?"),
            ChatMessage::assistant("A converged database release."),
        ];

        let messages = contextualize_messages(&history, "Does it support vectors?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].role, "assistant");
        assert_eq!(messages[3].role, "user");
        assert_eq!(messages[3].content, "Does it support vectors?");
    }

    #[test]
    fn test_answer_messages_stuff_context() {
        let messages = answer_messages("doc one\n\ndoc two", &[], "question?");

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("doc one"));
        assert!(messages[0].content.contains("doc two"));
        assert_eq!(messages[1].content, "question?");
    }
}
