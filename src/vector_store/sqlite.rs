//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust. The corpus this tool
//! serves is a handful of documents, so a full scan per query is fine.

use super::{cosine_similarity, IndexedSource, SearchResult, StoredChunk, VectorStore};
use crate::error::{ColabError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        source_file TEXT NOT NULL,
        page_number INTEGER,
        chunk_order INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_source_file ON chunks(source_file);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Several chat sessions may share the index
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ColabError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_chunk(row: &Row<'_>) -> rusqlite::Result<StoredChunk> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(5)?;
        let indexed_at_str: String = row.get(6)?;

        Ok(StoredChunk {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            source_file: row.get(1)?,
            page_number: row.get(2)?,
            chunk_order: row.get(3)?,
            content: row.get(4)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert_batch(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, source_file, page_number, chunk_order, content, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.source_file,
                    chunk.page_number,
                    chunk.chunk_order,
                    chunk.content,
                    Self::embedding_to_bytes(&chunk.embedding),
                    chunk.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, source_file, page_number, chunk_order, content, embedding, indexed_at
            FROM chunks
            "#,
        )?;

        let chunks = stmt.query_map([], Self::row_to_chunk)?;

        let mut results: Vec<SearchResult> = chunks
            .filter_map(|chunk| chunk.ok())
            .map(|chunk| SearchResult {
                score: cosine_similarity(query_embedding, &chunk.embedding),
                chunk,
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, source_file: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute(
            "DELETE FROM chunks WHERE source_file = ?1",
            params![source_file],
        )?;

        info!("Deleted {} chunks for source {}", deleted, source_file);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source_file, COUNT(*) AS chunk_count,
                   COUNT(DISTINCT page_number) AS page_count, MAX(indexed_at) AS indexed_at
            FROM chunks
            GROUP BY source_file
            ORDER BY indexed_at DESC
            "#,
        )?;

        let sources = stmt.query_map([], |row| {
            let indexed_at_str: String = row.get(3)?;
            Ok(IndexedSource {
                source_file: row.get(0)?,
                chunk_count: row.get(1)?,
                page_count: row.get(2)?,
                indexed_at: Self::parse_timestamp(&indexed_at_str),
            })
        })?;

        Ok(sources.filter_map(|s| s.ok()).collect())
    }

    async fn is_source_indexed(&self, source_file: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE source_file = ?1",
            params![source_file],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        let chunks = vec![
            StoredChunk::new("artigoA.pdf", Some(1), 0, "Introdução".to_string(), vec![1.0, 0.0, 0.0]),
            StoredChunk::new("artigoA.pdf", Some(2), 1, "Método".to_string(), vec![0.0, 1.0, 0.0]),
            StoredChunk::new("artigoB.pdf", None, 0, "Sem página".to_string(), vec![0.0, 0.0, 1.0]),
        ];
        assert_eq!(store.upsert_batch(&chunks).await.unwrap(), 3);

        let sources = store.list_sources().await.unwrap();
        assert_eq!(sources.len(), 2);
        let a = sources.iter().find(|s| s.source_file == "artigoA.pdf").unwrap();
        assert_eq!(a.chunk_count, 2);
        assert_eq!(a.page_count, 2);

        let results = store.search(&[0.0, 0.0, 1.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.source_file, "artigoB.pdf");
        assert_eq!(results[0].chunk.page_number, None);
        assert!((results[0].score - 1.0).abs() < 0.001);

        assert_eq!(store.delete_by_source("artigoA.pdf").await.unwrap(), 2);
        assert!(!store.is_source_indexed("artigoA.pdf").await.unwrap());
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            let chunk = StoredChunk::new("artigoA.pdf", Some(4), 0, "texto".to_string(), vec![0.5, 0.5]);
            store.upsert_batch(&[chunk]).await.unwrap();
        }

        let reopened = SqliteVectorStore::new(&path).unwrap();
        let results = reopened.search(&[0.5, 0.5], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.page_number, Some(4));
        assert_eq!(results[0].chunk.embedding, vec![0.5, 0.5]);
    }
}
