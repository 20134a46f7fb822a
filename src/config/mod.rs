//! Configuration module for Colaborai.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    AgentSettings, ConversationSettings, EmbeddingSettings, GeneralSettings, IngestSettings,
    LlmSettings, PromptSettings, RetrievalSettings, Settings, VectorStoreSettings,
    DATA_DIR_ENV, DEFAULT_MAX_TURNS, EXERCISE_CONTEXT_WINDOW, HISTORY_FILE_ENV,
    HISTORY_MAX_LINES, MAX_EXPANSION_KEYWORDS, MIN_KEYWORD_LEN, PARTICIPANT_WINDOW,
    RECENT_CONTEXT_TURNS, SOURCE_MATCH_CUTOFF,
};
