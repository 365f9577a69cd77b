//! Conversational RAG chain: condense -> retrieve -> generate

use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::info_span;
use tracing::Instrument;

use crate::config::AppConfig;
use crate::conversation::ChatMessage;
use crate::embeddings::EmbeddingClient;
use crate::embeddings::EmbeddingConfig;
use crate::errors::Result;
use crate::llm::prompts;
use crate::llm::LlmClient;
use crate::llm::StreamingResponse;
use crate::vectorstore::Document;
use crate::vectorstore::VectorStore;

/// Complete conversational RAG chain
pub struct RagChain {
    embeddings: Arc<EmbeddingClient>,
    vector_store: Arc<VectorStore>,
    llm: Arc<LlmClient>,
    top_k: usize,
}

impl RagChain {
    /// Create a new chain, building all collaborators from configuration
    ///
    /// # Errors
    /// - Database connection errors
    /// - Embedding client configuration errors (invalid endpoints, keys)
    /// - LLM client configuration errors
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let embeddings = Arc::new(EmbeddingClient::from_config(
            &EmbeddingConfig::from_app_config(config),
        )?);
        let vector_store = Arc::new(VectorStore::from_config(config).await?);
        let llm = Arc::new(LlmClient::new(config)?);

        Ok(Self::from_services(
            embeddings,
            vector_store,
            llm,
            config.top_k(),
        ))
    }

    /// Create from existing services
    #[must_use]
    pub fn from_services(
        embeddings: Arc<EmbeddingClient>,
        vector_store: Arc<VectorStore>,
        llm: Arc<LlmClient>,
        top_k: usize,
    ) -> Self {
        Self {
            embeddings,
            vector_store,
            llm,
            top_k,
        }
    }

    /// Answer a question against the given chat history.
    ///
    /// The history is the caller's snapshot; this method never mutates
    /// conversation state.
    ///
    /// # Errors
    /// - Question condensation or answer generation errors (LLM API failures)
    /// - Retrieval errors (embedding generation, database queries)
    pub async fn invoke(&self, query: &str, history: &[ChatMessage]) -> Result<RagResponse> {
        info!("Processing RAG query: {}", query);

        let standalone = self.condense_question(query, history).await?;
        let documents = self.retrieve(&standalone).await?;
        let context = format_docs(&documents);

        let messages = prompts::answer_messages(&context, history, query);
        let answer = self
            .llm
            .chat(&messages)
            .instrument(info_span!("generate_answer"))
            .await?;

        info!("RAG query completed successfully");

        Ok(RagResponse {
            answer,
            sources: documents,
        })
    }

    /// Answer a question as a stream of fragments.
    ///
    /// Retrieval runs to completion before the stream is returned; only the
    /// generation step is incremental.
    ///
    /// # Errors
    /// - Question condensation or retrieval errors, as for
    ///   [`RagChain::invoke`]; generation errors surface as stream items
    pub async fn stream(&self, query: &str, history: &[ChatMessage]) -> Result<StreamingResponse> {
        info!("Processing streaming RAG query: {}", query);

        let standalone = self.condense_question(query, history).await?;
        let documents = self.retrieve(&standalone).await?;
        let context = format_docs(&documents);

        let messages = prompts::answer_messages(&context, history, query);
        self.llm
            .chat_stream(&messages)
            .instrument(info_span!("generate_answer_stream"))
            .await
    }

    /// Rewrite a follow-up question as a standalone one.
    ///
    /// With no history the question is already standalone and the LLM round
    /// trip is skipped.
    async fn condense_question(&self, query: &str, history: &[ChatMessage]) -> Result<String> {
        if history.is_empty() {
            return Ok(query.to_string());
        }

        let messages = prompts::contextualize_messages(history, query);
        let standalone = self
            .llm
            .chat(&messages)
            .instrument(info_span!("condense_question"))
            .await?;

        debug!("Condensed question: {}", standalone);
        Ok(standalone)
    }

    /// Embed the question and fetch the closest documents
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>> {
        let span = info_span!("retrieve_documents", top_k = self.top_k);

        async {
            let embedding = self.embeddings.generate(question).await?;
            let documents = self
                .vector_store
                .similarity_search(embedding, self.top_k)
                .await?;

            debug!("Retrieved {} documents", documents.len());
            Ok(documents)
        }
        .instrument(span)
        .await
    }

    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// Format documents to be presented in the prompt
#[must_use]
pub fn format_docs(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// RAG response
#[derive(Debug, Clone)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<Document>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(content: &str) -> Document {
        Document {
            content: content.to_string(),
            metadata: serde_json::json!({}),
            score: 0.9,
        }
    }

    #[test]
    fn test_format_docs_joins_with_blank_lines() {
        let docs = vec![doc("first passage"), doc("second passage")];
        assert_eq!(format_docs(&docs), "first passage\n\nsecond passage");
    }

    #[test]
    fn test_format_docs_empty() {
        assert_eq!(format_docs(&[]), "");
    }
}
