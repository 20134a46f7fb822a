//! Colaborai - Collaborative study assistant
//!
//! A tool-using conversational agent for small study groups discussing a
//! handful of articles.
//!
//! # Overview
//!
//! Colaborai allows you to:
//! - Index text articles into a local vector database with page citations
//! - Share one conversation log between several participants
//! - Ask an assistant that searches the articles, reads the discussion history
//!   and prepares personalized fixation exercises
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `conversation` - The shared, append-only conversation log
//! - `ingest` - Document loading and chunking
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `corpus` - Semantic search over indexed chunks
//! - `llm` - Chat model abstraction with tool calling
//! - `agent` - The tools and the tool-calling orchestrator
//! - `session` - The collaborative chat room
//! - `app` - Component wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use colaborai::app::App;
//! use colaborai::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::new(Settings::load()?)?;
//!     let room = app.chat_room(app.language_model()?)?;
//!
//!     room.post("Ana", "Li o artigo A ontem.").await?;
//!     let outcome = room.post("Pedro", "@colaborai qual é a metodologia do artigo A?").await?;
//!     println!("{}", outcome.reply().unwrap_or_default());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod session;
pub mod vector_store;

pub use error::{ColabError, Result};
