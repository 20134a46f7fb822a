//! Corpus index backed by an embedder and a vector store.

use super::{CorpusIndex, DocumentChunk};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds the query and returns the top-k nearest stored chunks.
pub struct VectorCorpusIndex {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl VectorCorpusIndex {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            top_k: 5,
        }
    }

    /// Set the number of chunks returned per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

#[async_trait]
impl CorpusIndex for VectorCorpusIndex {
    #[instrument(skip(self), fields(top_k = self.top_k))]
    async fn search(&self, query: &str) -> Result<Vec<DocumentChunk>> {
        let embedding = self.embedder.embed(query).await?;
        let results = self.vector_store.search(&embedding, self.top_k).await?;
        debug!("Corpus query returned {} chunks", results.len());

        Ok(results
            .into_iter()
            .map(|r| DocumentChunk::from(r.chunk))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{MemoryVectorStore, StoredChunk};

    /// Maps a handful of words onto fixed axes.
    struct KeywordEmbedder;

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let text = text.to_lowercase();
            Ok(vec![
                if text.contains("metodologia") { 1.0 } else { 0.0 },
                if text.contains("resultados") { 1.0 } else { 0.0 },
                0.1,
            ])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::new();
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    #[tokio::test]
    async fn test_vector_corpus_index_ranks_and_limits() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[
                StoredChunk::new("artigoA.pdf", Some(2), 0, "A metodologia".into(), vec![1.0, 0.0, 0.1]),
                StoredChunk::new("artigoB.pdf", Some(7), 0, "Os resultados".into(), vec![0.0, 1.0, 0.1]),
                StoredChunk::new("artigoB.pdf", Some(8), 1, "Outro".into(), vec![0.0, 0.0, 0.1]),
            ])
            .await
            .unwrap();

        let index = VectorCorpusIndex::new(store, Arc::new(KeywordEmbedder)).with_top_k(2);
        let chunks = index.search("qual a metodologia?").await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source_file.as_deref(), Some("artigoA.pdf"));
        assert_eq!(chunks[0].page_number, Some(2));
    }
}
