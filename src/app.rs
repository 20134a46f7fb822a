//! Component wiring for the command line front end.
//!
//! Builds the embedder, vector store, conversation log and agent from
//! [`Settings`], so commands only deal with the pieces they need.

use crate::agent::{Orchestrator, ToolContext, ToolLimits};
use crate::config::{Prompts, Settings};
use crate::conversation::ConversationLog;
use crate::corpus::{CorpusIndex, VectorCorpusIndex};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::llm::{LanguageModel, OpenAIChatModel};
use crate::session::ChatRoom;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use std::sync::Arc;
use tracing::info;

/// Name the system instruction uses for the exercise tool.
const EXERCISE_TOOL_NAME: &str = "fixation_exercise_tool";

/// The assembled application.
pub struct App {
    settings: Settings,
    prompts: Prompts,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    log: Arc<ConversationLog>,
}

impl App {
    /// Create the application from configuration.
    pub fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let vector_store: Arc<dyn VectorStore> =
            Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?);
        let log = Arc::new(ConversationLog::new(settings.history_path()));
        info!("Conversation log at {:?}", log.path());

        Ok(Self {
            settings,
            prompts,
            embedder,
            vector_store,
            log,
        })
    }

    /// Create the application with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        log: Arc<ConversationLog>,
    ) -> Self {
        Self {
            settings,
            prompts,
            embedder,
            vector_store,
            log,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn log(&self) -> Arc<ConversationLog> {
        self.log.clone()
    }

    pub fn ingestor(&self) -> Result<Ingestor> {
        Ingestor::from_settings(&self.settings, self.embedder.clone(), self.vector_store.clone())
    }

    pub fn corpus_index(&self) -> Arc<dyn CorpusIndex> {
        Arc::new(
            VectorCorpusIndex::new(self.vector_store.clone(), self.embedder.clone())
                .with_top_k(self.settings.retrieval.top_k),
        )
    }

    pub fn tool_context(&self) -> ToolContext {
        ToolContext::with_limits(
            self.log.clone(),
            self.corpus_index(),
            self.prompts.exercise_instructions(),
            ToolLimits::from_settings(&self.settings),
        )
    }

    /// The configured chat model.
    pub fn language_model(&self) -> Result<Arc<dyn LanguageModel>> {
        Ok(Arc::new(OpenAIChatModel::from_settings(&self.settings.llm)?))
    }

    pub fn orchestrator(&self, model: Arc<dyn LanguageModel>) -> Orchestrator {
        Orchestrator::new(
            model,
            self.tool_context(),
            self.prompts.system_instruction(EXERCISE_TOOL_NAME),
        )
        .with_max_turns(self.settings.agent.max_turns)
        .with_recent_context_turns(self.settings.conversation.recent_context_turns)
    }

    pub fn chat_room(&self, model: Arc<dyn LanguageModel>) -> Result<ChatRoom> {
        ChatRoom::new(self.orchestrator(model), &self.settings.conversation.mention)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::AssistantMessage;
    use crate::vector_store::{MemoryVectorStore, StoredChunk};
    use async_trait::async_trait;

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_components_are_wired_together() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert_batch(&[StoredChunk::new("artigoA.pdf", Some(2), 0, "Método".to_string(), vec![1.0, 0.0])])
            .await
            .unwrap();

        let mut settings = Settings::default();
        settings.agent.max_turns = 4;
        let app = App::with_components(
            settings,
            Prompts::default(),
            Arc::new(ConstantEmbedder),
            store,
            Arc::new(ConversationLog::new(dir.path().join("history.txt"))),
        );

        let chunks = app.corpus_index().search("método").await.unwrap();
        assert_eq!(chunks[0].citation(), "(source: artigoA.pdf, page: 2)");

        let model = Arc::new(ScriptedModel::new(vec![AssistantMessage::text("Resposta")]));
        let room = app.chat_room(model.clone()).unwrap();
        let outcome = room.post("Ana", "@colaborai o que é o método?").await.unwrap();
        assert_eq!(outcome.reply(), Some("Resposta"));

        let system = &model.requests()[0][0];
        match system {
            crate::llm::AgentMessage::System { content } => {
                assert!(content.contains(EXERCISE_TOOL_NAME));
            }
            other => panic!("Expected system message, got {:?}", other),
        }
    }
}
