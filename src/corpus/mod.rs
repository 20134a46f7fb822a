//! Corpus search abstraction.
//!
//! The agent tools only see [`CorpusIndex`]: a query goes in, a ranked list of
//! [`DocumentChunk`]s with citation metadata comes out.

mod index;

pub use index::VectorCorpusIndex;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A retrieved excerpt of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Text content of the excerpt.
    pub content: String,
    /// Stable name of the source document (e.g. `artigoA.pdf`).
    pub source_file: Option<String>,
    /// 1-based page number within the source.
    pub page_number: Option<u32>,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, source_file: impl Into<String>, page_number: u32) -> Self {
        Self {
            content: content.into(),
            source_file: Some(source_file.into()),
            page_number: Some(page_number),
        }
    }

    /// Source name for citations, `"unknown"` when missing.
    pub fn source_label(&self) -> &str {
        self.source_file.as_deref().unwrap_or("unknown")
    }

    /// Page number for citations, `"?"` when missing.
    pub fn page_label(&self) -> String {
        self.page_number
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string())
    }

    /// Citation in the form `(source: <file>, page: <n>)`.
    pub fn citation(&self) -> String {
        format!("(source: {}, page: {})", self.source_label(), self.page_label())
    }
}

/// Semantic search over the ingested corpus.
#[async_trait]
pub trait CorpusIndex: Send + Sync {
    /// Return the chunks most relevant to `query`, best first.
    async fn search(&self, query: &str) -> Result<Vec<DocumentChunk>>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test doubles for [`CorpusIndex`].

    use super::*;
    use crate::error::ColabError;
    use std::sync::Mutex;

    /// Returns a fixed result set for every query and records the queries.
    pub struct StaticIndex {
        chunks: Vec<DocumentChunk>,
        pub queries: Mutex<Vec<String>>,
    }

    impl StaticIndex {
        pub fn new(chunks: Vec<DocumentChunk>) -> Self {
            Self {
                chunks,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CorpusIndex for StaticIndex {
        async fn search(&self, query: &str) -> Result<Vec<DocumentChunk>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.chunks.clone())
        }
    }

    /// Answers from a per-query table, empty for unknown queries.
    pub struct TableIndex {
        pub table: Vec<(String, Vec<DocumentChunk>)>,
    }

    #[async_trait]
    impl CorpusIndex for TableIndex {
        async fn search(&self, query: &str) -> Result<Vec<DocumentChunk>> {
            Ok(self
                .table
                .iter()
                .find(|(q, _)| q == query)
                .map(|(_, chunks)| chunks.clone())
                .unwrap_or_default())
        }
    }

    /// Fails every search.
    pub struct FailingIndex;

    #[async_trait]
    impl CorpusIndex for FailingIndex {
        async fn search(&self, _query: &str) -> Result<Vec<DocumentChunk>> {
            Err(ColabError::Corpus("index offline".to_string()))
        }
    }
}
