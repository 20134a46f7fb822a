//! Error types for Colaborai.

use thiserror::Error;

/// Library-level error type for Colaborai operations.
#[derive(Error, Debug)]
pub enum ColabError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A document referenced for ingestion does not exist. This is the only
    /// condition that aborts an operation instead of degrading to text.
    #[error("Source document not found: {0}")]
    SourceNotFound(String),

    #[error("Ingestion failed: {0}")]
    Ingest(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Corpus search failed: {0}")]
    Corpus(String),

    #[error("Conversation log error: {0}")]
    ConversationLog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Language model API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Agent error: {0}")]
    Agent(String),
}

/// Result type alias for Colaborai operations.
pub type Result<T> = std::result::Result<T, ColabError>;
