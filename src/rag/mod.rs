//! RAG (Retrieval-Augmented Generation) module
//!
//! End-to-end conversational RAG:
//! - Condensing a follow-up question against chat history
//! - Semantic retrieval using vector embeddings
//! - Context assembly from retrieved documents
//! - LLM-based answer generation, blocking or streamed

pub mod chain;

pub use chain::format_docs;
pub use chain::RagChain;
pub use chain::RagResponse;
