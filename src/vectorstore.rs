//! Vector similarity search over Postgres + pgvector

use serde::Serialize;
use sqlx::PgPool;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::RagChatError;
use crate::errors::Result;

/// Retrieved document with its relevance score
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Document {
    pub content: String,
    pub metadata: serde_json::Value,
    pub score: f64,
}

/// Similarity search over one pgvector-backed collection table
pub struct VectorStore {
    pool: PgPool,
    collection: String,
}

impl VectorStore {
    pub fn new(pool: PgPool, collection: String) -> Result<Self> {
        validate_collection(&collection)?;
        Ok(Self { pool, collection })
    }

    /// Create a new vector store instance from configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;
        Self::new(pool, config.collection().to_string())
    }

    /// Return the `k` documents closest to `query_embedding` by cosine
    /// distance, best match first.
    pub async fn similarity_search(
        &self,
        query_embedding: Vec<f32>,
        k: usize,
    ) -> Result<Vec<Document>> {
        debug!(
            "Similarity search in collection {} (top {})",
            self.collection, k
        );

        // Table names cannot be bound; the collection identifier is
        // validated at construction time.
        let query = format!(
            r"
            SELECT content, metadata, 1 - (embedding <=> $1) AS score
            FROM {}
            WHERE embedding IS NOT NULL
            ORDER BY embedding <=> $1
            LIMIT $2
            ",
            self.collection
        );

        let documents = sqlx::query_as::<_, Document>(&query)
            .bind(pgvector::Vector::from(query_embedding))
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(documents)
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn validate_collection(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RagChatError::ConfigError(format!(
            "Invalid collection name: {name}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection("documents").is_ok());
        assert!(validate_collection("oracle_knowledge_23ai").is_ok());

        assert!(validate_collection("").is_err());
        assert!(validate_collection("docs; drop table users").is_err());
        assert!(validate_collection("docs-2024").is_err());
    }
}
