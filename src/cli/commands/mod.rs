//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod exercises;
mod history;
mod ingest;
mod search;
mod sources;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use exercises::run_exercises;
pub use history::run_history;
pub use ingest::run_ingest;
pub use search::run_search;
pub use sources::run_sources;
