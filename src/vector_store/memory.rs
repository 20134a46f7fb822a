//! In-memory vector store implementation.
//!
//! Useful for testing and small corpora.

use super::{cosine_similarity, IndexedSource, SearchResult, StoredChunk, VectorStore};
use crate::error::{ColabError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// In-memory vector store.
pub struct MemoryVectorStore {
    chunks: RwLock<HashMap<String, StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }

    fn poisoned<E: std::fmt::Display>(e: E) -> ColabError {
        ColabError::VectorStore(format!("Failed to acquire lock: {}", e))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let mut store = self.chunks.write().map_err(Self::poisoned)?;
        for chunk in chunks {
            store.insert(chunk.id.to_string(), chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let chunks = self.chunks.read().map_err(Self::poisoned)?;

        let mut results: Vec<SearchResult> = chunks
            .values()
            .map(|chunk| SearchResult {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk: chunk.clone(),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn delete_by_source(&self, source_file: &str) -> Result<usize> {
        let mut chunks = self.chunks.write().map_err(Self::poisoned)?;
        let initial_len = chunks.len();
        chunks.retain(|_, chunk| chunk.source_file != source_file);
        Ok(initial_len - chunks.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let chunks = self.chunks.read().map_err(Self::poisoned)?;

        let mut sources: HashMap<String, (IndexedSource, HashSet<Option<u32>>)> = HashMap::new();

        for chunk in chunks.values() {
            let (entry, pages) = sources.entry(chunk.source_file.clone()).or_insert_with(|| {
                (
                    IndexedSource {
                        source_file: chunk.source_file.clone(),
                        chunk_count: 0,
                        page_count: 0,
                        indexed_at: chunk.indexed_at,
                    },
                    HashSet::new(),
                )
            });

            entry.chunk_count += 1;
            pages.insert(chunk.page_number);
            if chunk.indexed_at > entry.indexed_at {
                entry.indexed_at = chunk.indexed_at;
            }
        }

        let mut result: Vec<IndexedSource> = sources
            .into_values()
            .map(|(mut source, pages)| {
                source.page_count = pages.len() as u32;
                source
            })
            .collect();
        result.sort_by(|a, b| b.indexed_at.cmp(&a.indexed_at));

        Ok(result)
    }

    async fn is_source_indexed(&self, source_file: &str) -> Result<bool> {
        let chunks = self.chunks.read().map_err(Self::poisoned)?;
        Ok(chunks.values().any(|c| c.source_file == source_file))
    }

    async fn document_count(&self) -> Result<usize> {
        let chunks = self.chunks.read().map_err(Self::poisoned)?;
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let chunk1 = StoredChunk::new("artigoA.pdf", Some(1), 0, "Hello world".to_string(), vec![1.0, 0.0, 0.0]);
        let chunk2 = StoredChunk::new("artigoA.pdf", Some(2), 1, "Goodbye world".to_string(), vec![0.0, 1.0, 0.0]);
        let chunk3 = StoredChunk::new("artigoA.pdf", Some(2), 2, "Goodbye again".to_string(), vec![0.0, 1.0, 0.0]);

        store.upsert_batch(&[chunk1, chunk2, chunk3]).await.unwrap();

        assert_eq!(store.document_count().await.unwrap(), 3);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].chunk.content, "Hello world");

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 3);
        assert_eq!(sources[0].page_count, 2);

        assert_eq!(store.delete_by_source("artigoA.pdf").await.unwrap(), 3);
        assert!(!store.is_source_indexed("artigoA.pdf").await.unwrap());
    }
}
