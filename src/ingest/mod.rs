//! Document ingestion: load, split, embed and index.

mod splitter;

pub use splitter::TextSplitter;

use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{ColabError, Result};
use crate::vector_store::{StoredChunk, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Page break marker in text documents.
pub const PAGE_BREAK: char = '\x0c';

/// One page of a loaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub number: u32,
    pub text: String,
}

/// A document ready for indexing.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Name recorded as the source of every chunk.
    pub source_name: String,
    pub pages: Vec<Page>,
}

/// Load a document page by page.
///
/// PDF files are read per page; anything else is UTF-8 text whose pages are
/// separated by form feeds. Blank pages are dropped but keep their numbers.
/// `source_name` defaults to the file name, so temporary upload paths never
/// leak into citations.
pub fn load_document(path: &Path, source_name: Option<&str>) -> Result<LoadedDocument> {
    if !path.is_file() {
        return Err(ColabError::SourceNotFound(path.display().to_string()));
    }

    let source_name = match source_name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ColabError::InvalidInput(format!("No file name in {:?}", path)))?,
    };

    let pages = if is_pdf(path) {
        load_pdf_pages(path)?
    } else {
        load_text_pages(path)?
    };

    Ok(LoadedDocument {
        source_name,
        pages: pages
            .into_iter()
            .filter(|page| !page.text.trim().is_empty())
            .collect(),
    })
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn load_text_pages(path: &Path) -> Result<Vec<Page>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| Page {
            number: i as u32 + 1,
            text: page.to_string(),
        })
        .collect())
}

fn load_pdf_pages(path: &Path) -> Result<Vec<Page>> {
    let document = lopdf::Document::load(path)
        .map_err(|e| ColabError::Ingest(format!("Failed to read PDF {}: {}", path.display(), e)))?;

    let mut pages = Vec::new();
    for &number in document.get_pages().keys() {
        match document.extract_text(&[number]) {
            Ok(text) => pages.push(Page { number, text }),
            Err(e) => warn!("Skipping page {} of {}: {}", number, path.display(), e),
        }
    }
    debug!("Read {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// Loads documents into the vector store.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    splitter: TextSplitter,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        splitter: TextSplitter,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            splitter,
        }
    }

    /// Create an ingestor with the configured chunk sizes.
    pub fn from_settings(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let splitter = TextSplitter::new(settings.ingest.chunk_size, settings.ingest.chunk_overlap)?;
        Ok(Self::new(embedder, vector_store, splitter))
    }

    /// Ingest one file. Already indexed sources are skipped unless `force`.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_file(
        &self,
        path: &Path,
        source_name: Option<&str>,
        force: bool,
    ) -> Result<IngestResult> {
        let document = load_document(path, source_name)?;

        if !force && self.vector_store.is_source_indexed(&document.source_name).await? {
            info!("Source {} is already indexed, skipping", document.source_name);
            return Ok(IngestResult {
                source_name: document.source_name,
                pages: document.pages.len(),
                chunks_indexed: 0,
                skipped: true,
            });
        }

        let chunks_indexed = self.index_document(&document).await?;
        info!(
            "Indexed {} chunks from {} ({} pages)",
            chunks_indexed,
            document.source_name,
            document.pages.len()
        );

        Ok(IngestResult {
            source_name: document.source_name,
            pages: document.pages.len(),
            chunks_indexed,
            skipped: false,
        })
    }

    /// Split, embed and store a document, replacing its previous chunks.
    ///
    /// Embeddings are computed before anything is deleted, so a failed
    /// re-index leaves the previous chunks in place.
    pub async fn index_document(&self, document: &LoadedDocument) -> Result<usize> {
        let pieces: Vec<(u32, String)> = document
            .pages
            .iter()
            .flat_map(|page| {
                self.splitter
                    .split(&page.text)
                    .into_iter()
                    .map(move |text| (page.number, text))
            })
            .collect();

        let embeddings = if pieces.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = pieces.iter().map(|(_, text)| text.clone()).collect();
            self.embedder.embed_batch(&texts).await?
        };
        if embeddings.len() != pieces.len() {
            return Err(ColabError::Ingest(format!(
                "Expected {} embeddings, got {}",
                pieces.len(),
                embeddings.len()
            )));
        }

        self.vector_store.delete_by_source(&document.source_name).await?;
        if pieces.is_empty() {
            return Ok(0);
        }

        let chunks: Vec<StoredChunk> = pieces
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(order, ((page, content), embedding))| {
                StoredChunk::new(
                    document.source_name.clone(),
                    Some(page),
                    order as i32,
                    content,
                    embedding,
                )
            })
            .collect();

        self.vector_store.upsert_batch(&chunks).await
    }
}

/// Result of ingesting one document.
#[derive(Debug)]
pub struct IngestResult {
    pub source_name: String,
    pub pages: usize,
    pub chunks_indexed: usize,
    /// Whether ingestion was skipped (already indexed).
    pub skipped: bool,
}
