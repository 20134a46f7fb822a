//! Tool registry and execution context for the agent.

use super::exercise::ExerciseTool;
use super::history::HistoryTool;
use super::retriever::RetrieverTool;
use crate::config::{
    Settings, EXERCISE_CONTEXT_WINDOW, HISTORY_MAX_LINES, PARTICIPANT_WINDOW, SOURCE_MATCH_CUTOFF,
};
use crate::conversation::ConversationLog;
use crate::corpus::CorpusIndex;
use crate::error::Result;
use crate::llm::ToolSpec;
use std::sync::Arc;

/// Result text for a call naming a tool that does not exist.
pub const INCORRECT_TOOL_NAME: &str =
    "Incorrect tool name; select an available tool and try again.";

/// The tools the model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Retriever,
    History,
    Exercise,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Retriever, ToolKind::History, ToolKind::Exercise];

    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Retriever => "retriever_tool",
            ToolKind::History => "conversation_history_tool",
            ToolKind::Exercise => "fixation_exercise_tool",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Declaration sent to the model.
    pub fn spec(&self) -> ToolSpec {
        let (description, query_description) = match self {
            ToolKind::Retriever => (
                "Search the indexed articles by semantic similarity and return the most relevant \
                 excerpts, each labeled with its source file and page. Restrict the search to one \
                 article by including `source: <file>` or `from <file>` in the query; article names \
                 are matched approximately (e.g. \"artigo1\" matches \"artigo1.pdf\"). Returns \
                 \"No relevant info was found in the document\" when nothing matches.",
                "What to search for, optionally with `source: <file>` or `from <file>`",
            ),
            ToolKind::History => (
                "Read the most recent messages of the shared chat, one per line as \
                 `role::username::content`. Pass a number to choose how many messages to read \
                 (at most 20); anything else returns the last 20.",
                "Number of recent messages to read",
            ),
            ToolKind::Exercise => (
                "Gather the material to write personalized fixation exercises for every chat \
                 participant: participants, recent discussion, reference excerpts from the \
                 articles and the exercise rubric, as a JSON payload. The query may name a focus \
                 topic or be left generic.",
                "Optional focus topic for the exercises",
            ),
        };

        ToolSpec {
            name: self.name().to_string(),
            description: description.to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": query_description
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Declarations of every tool.
pub fn tool_definitions() -> Vec<ToolSpec> {
    ToolKind::ALL.iter().map(ToolKind::spec).collect()
}

/// Extract the `query` argument from a tool call's raw arguments.
///
/// Arguments that are not a JSON object are used as the query verbatim.
pub fn parse_query(arguments: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(arguments) {
        Ok(serde_json::Value::Object(map)) => match map.get("query") {
            Some(serde_json::Value::String(query)) => query.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
        Ok(serde_json::Value::String(query)) => query,
        _ => arguments.to_string(),
    }
}

/// Windows and thresholds the tools work with.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolLimits {
    pub source_match_cutoff: f32,
    pub history_max_lines: usize,
    pub participant_window: usize,
    pub exercise_context_window: usize,
}

impl Default for ToolLimits {
    fn default() -> Self {
        Self {
            source_match_cutoff: SOURCE_MATCH_CUTOFF,
            history_max_lines: HISTORY_MAX_LINES,
            participant_window: PARTICIPANT_WINDOW,
            exercise_context_window: EXERCISE_CONTEXT_WINDOW,
        }
    }
}

impl ToolLimits {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            source_match_cutoff: settings.retrieval.source_match_cutoff,
            history_max_lines: settings.conversation.history_max_lines.min(HISTORY_MAX_LINES),
            participant_window: settings.conversation.participant_window,
            exercise_context_window: settings.conversation.exercise_context_window,
        }
    }
}

/// Everything a tool call may touch: the shared log, the corpus and limits.
pub struct ToolContext {
    pub log: Arc<ConversationLog>,
    pub index: Arc<dyn CorpusIndex>,
    pub limits: ToolLimits,
    retriever: RetrieverTool,
    history: HistoryTool,
    exercise: ExerciseTool,
}

impl ToolContext {
    /// Create a tool context with default limits.
    pub fn new(
        log: Arc<ConversationLog>,
        index: Arc<dyn CorpusIndex>,
        exercise_instructions: impl Into<String>,
    ) -> Self {
        Self::with_limits(log, index, exercise_instructions, ToolLimits::default())
    }

    pub fn with_limits(
        log: Arc<ConversationLog>,
        index: Arc<dyn CorpusIndex>,
        exercise_instructions: impl Into<String>,
        limits: ToolLimits,
    ) -> Self {
        Self {
            retriever: RetrieverTool::new(limits.source_match_cutoff),
            history: HistoryTool::new(limits.history_max_lines),
            exercise: ExerciseTool::new(exercise_instructions),
            log,
            index,
            limits,
        }
    }

    /// Execute a tool with the given query and return its text output.
    pub async fn execute(&self, kind: ToolKind, query: &str) -> Result<String> {
        match kind {
            ToolKind::Retriever => self.retriever.run(self.index.as_ref(), query).await,
            ToolKind::History => Ok(self.history.run(&self.log, query)),
            ToolKind::Exercise => self.exercise.run(self, query).await,
        }
    }

    /// Execute a tool call by name. Unknown names yield a fixed message.
    pub async fn execute_named(&self, name: &str, query: &str) -> Result<String> {
        match ToolKind::from_name(name) {
            Some(kind) => self.execute(kind, query).await,
            None => Ok(INCORRECT_TOOL_NAME.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationMessage;
    use crate::corpus::testing::StaticIndex;
    use crate::corpus::DocumentChunk;

    fn context(dir: &tempfile::TempDir) -> ToolContext {
        let log = Arc::new(ConversationLog::new(dir.path().join("history.txt")));
        let index = Arc::new(StaticIndex::new(vec![DocumentChunk::new(
            "Texto sobre entropia.",
            "artigoA.pdf",
            2,
        )]));
        ToolContext::new(log, index, "Crie exercícios.")
    }

    #[test]
    fn test_tool_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("history"), None);
        assert_eq!(ToolKind::Retriever.to_string(), "retriever_tool");
    }

    #[test]
    fn test_tool_definitions() {
        let definitions = tool_definitions();
        let names: Vec<_> = definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["retriever_tool", "conversation_history_tool", "fixation_exercise_tool"]
        );
        for definition in &definitions {
            assert_eq!(definition.parameters["required"][0], "query");
        }
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(parse_query(r#"{"query": "metodologia"}"#), "metodologia");
        assert_eq!(parse_query(r#"{"query": 10}"#), "10");
        assert_eq!(parse_query(r#"{}"#), "");
        assert_eq!(parse_query(r#""resultados""#), "resultados");
        assert_eq!(parse_query("texto solto"), "texto solto");
    }

    #[test]
    fn test_limits_follow_settings() {
        let mut settings = Settings::default();
        settings.conversation.history_max_lines = 7;
        settings.retrieval.source_match_cutoff = 0.8;

        let limits = ToolLimits::from_settings(&settings);
        assert_eq!(limits.history_max_lines, 7);
        assert_eq!(limits.source_match_cutoff, 0.8);
        assert_eq!(limits.participant_window, PARTICIPANT_WINDOW);
    }

    #[tokio::test]
    async fn test_history_limit_never_exceeds_twenty_lines() {
        let mut settings = Settings::default();
        settings.conversation.history_max_lines = 50;
        let limits = ToolLimits::from_settings(&settings);
        assert_eq!(limits.history_max_lines, HISTORY_MAX_LINES);

        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(ConversationLog::new(dir.path().join("history.txt")));
        for i in 0..30 {
            log.append(&ConversationMessage::user("Ana", format!("mensagem {}", i)))
                .unwrap();
        }
        let tools = ToolContext::with_limits(
            log,
            Arc::new(StaticIndex::new(Vec::new())),
            "Rubrica",
            limits,
        );

        let output = tools.execute(ToolKind::History, "50").await.unwrap();
        assert_eq!(output.lines().count(), 20);
        assert!(output.ends_with("user::Ana::mensagem 29"));
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        ctx.log.append(&ConversationMessage::user("Ana", "O que é X?")).unwrap();

        let history = ctx.execute_named("conversation_history_tool", "1").await.unwrap();
        assert_eq!(history, "user::Ana::O que é X?");

        let retrieved = ctx.execute_named("retriever_tool", "entropia").await.unwrap();
        assert!(retrieved.starts_with("Document 1 (source: artigoA.pdf, page: 2)"));

        let exercise = ctx.execute_named("fixation_exercise_tool", "").await.unwrap();
        assert!(exercise.contains("\"participants\""));

        let unknown = ctx.execute_named("delete_everything", "").await.unwrap();
        assert_eq!(unknown, INCORRECT_TOOL_NAME);
    }
}
