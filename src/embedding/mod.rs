//! Vector embeddings for article chunks and retrieval queries.
//!
//! Ingestion and search must use the same [`Embedder`], otherwise stored
//! chunks and queries land in different vector spaces.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Turns text into vectors comparable by cosine similarity.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a retrieval query.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of chunks, one vector per input in the same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
