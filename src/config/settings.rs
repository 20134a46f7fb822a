//! Configuration settings for Colaborai.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Similarity cutoff for fuzzy source-name matching.
pub const SOURCE_MATCH_CUTOFF: f32 = 0.6;
/// Keywords must be longer than this many characters.
pub const MIN_KEYWORD_LEN: usize = 4;
/// Number of expansion keywords appended to an exercise topic.
pub const MAX_EXPANSION_KEYWORDS: usize = 8;
/// Log turns injected as context before every model call.
pub const RECENT_CONTEXT_TURNS: usize = 5;
/// Upper bound (and default) for the history tool.
pub const HISTORY_MAX_LINES: usize = 20;
/// Log lines scanned for exercise participants.
pub const PARTICIPANT_WINDOW: usize = 200;
/// Log lines used as the exercise conversation context.
pub const EXERCISE_CONTEXT_WINDOW: usize = 50;
/// Default model calls allowed per agent invocation.
pub const DEFAULT_MAX_TURNS: usize = 15;

/// Environment variable overriding the conversation log location.
pub const HISTORY_FILE_ENV: &str = "RAG_HISTORY_FILE";
/// Environment variable overriding the shared data directory.
pub const DATA_DIR_ENV: &str = "RAG_VDB_DIR";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub conversation: ConversationSettings,
    pub agent: AgentSettings,
    pub ingest: IngestSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Shared directory for the index and the conversation log.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.colaborai".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Chat model settings (any OpenAI-compatible endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model identifier.
    pub model: String,
    /// Base URL of the chat completions API.
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "nvidia/nemotron-nano-12b-v2-vl:free".to_string(),
            api_base: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            temperature: 0.0,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Base URL of the embeddings API.
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Path to the SQLite database. Relative paths resolve against the data dir.
    pub sqlite_path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "vectors.db".to_string(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks returned per corpus query.
    pub top_k: usize,
    /// Similarity cutoff for fuzzy source filters.
    pub source_match_cutoff: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            source_match_cutoff: SOURCE_MATCH_CUTOFF,
        }
    }
}

/// Shared conversation log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Log file. Relative paths resolve against the data dir.
    pub history_file: String,
    /// Log turns injected before every model call.
    pub recent_context_turns: usize,
    /// Maximum lines the history tool returns.
    pub history_max_lines: usize,
    /// Log lines scanned for exercise participants.
    pub participant_window: usize,
    /// Log lines used as exercise context.
    pub exercise_context_window: usize,
    /// Known participants offered by the interactive chat.
    pub participants: Vec<String>,
    /// Mention that summons the assistant in a chat message.
    pub mention: String,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            history_file: "conversation_history.txt".to_string(),
            recent_context_turns: RECENT_CONTEXT_TURNS,
            history_max_lines: HISTORY_MAX_LINES,
            participant_window: PARTICIPANT_WINDOW,
            exercise_context_window: EXERCISE_CONTEXT_WINDOW,
            participants: ["Artur", "Pedro", "João", "Rebeca", "Lucas"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mention: "@colaborai".to_string(),
        }
    }
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model calls per invocation.
    pub max_turns: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

/// Document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("colaborai")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the data directory, honoring the `RAG_VDB_DIR` override.
    pub fn data_dir(&self) -> PathBuf {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => Self::expand_path(&dir),
            _ => Self::expand_path(&self.general.data_dir),
        }
    }

    /// Get the SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        self.resolve_in_data_dir(&self.vector_store.sqlite_path)
    }

    /// Get the conversation log path, honoring the `RAG_HISTORY_FILE` override.
    pub fn history_path(&self) -> PathBuf {
        match std::env::var(HISTORY_FILE_ENV) {
            Ok(file) if !file.is_empty() => Self::expand_path(&file),
            _ => self.resolve_in_data_dir(&self.conversation.history_file),
        }
    }

    fn resolve_in_data_dir(&self, path: &str) -> PathBuf {
        let expanded = Self::expand_path(path);
        if expanded.is_absolute() {
            expanded
        } else {
            self.data_dir().join(expanded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [agent]
            max_turns = 3

            [retrieval]
            top_k = 9
            "#,
        )
        .unwrap();

        assert_eq!(settings.agent.max_turns, 3);
        assert_eq!(settings.retrieval.top_k, 9);
        assert_eq!(settings.retrieval.source_match_cutoff, SOURCE_MATCH_CUTOFF);
        assert_eq!(settings.conversation.history_max_lines, HISTORY_MAX_LINES);
        assert_eq!(settings.conversation.mention, "@colaborai");
    }

    #[test]
    fn test_absolute_paths_are_not_rebased() {
        let mut settings = Settings::default();
        settings.general.data_dir = "/srv/colab".to_string();
        settings.vector_store.sqlite_path = "/var/lib/index.db".to_string();

        assert_eq!(settings.sqlite_path(), PathBuf::from("/var/lib/index.db"));
    }

    #[test]
    fn test_serialized_settings_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.llm.model = "some/model".to_string();
        std::fs::write(&path, toml::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.llm.model, "some/model");
    }
}
