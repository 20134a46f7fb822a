//! Assembly of fixation exercise material.
//!
//! The tool does not write exercises itself. It gathers who took part in the
//! chat, what they discussed and which article excerpts are relevant, and
//! hands the model a JSON payload together with the exercise rubric.

use super::keywords::KeywordExtractor;
use super::tools::ToolContext;
use crate::conversation::{split_fields, Role};
use crate::corpus::{CorpusIndex, DocumentChunk};
use crate::error::Result;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TOPIC: &str = "panorama geral dos artigos";
const GENERAL_QUERY: &str = "principais conceitos metodologia resultados conclusões";
const ANONYMOUS_PARTICIPANT: &str = "Usuário";
const FALLBACK_PARTICIPANT: &str = "Grupo";
const UNKNOWN_SOURCE: &str = "desconhecido";

const MAIN_RESULTS: usize = 10;
const DISCUSSION_RESULTS: usize = 5;
const GENERAL_RESULTS: usize = 5;
const MAX_REFERENCES: usize = 12;
const EXCERPT_CHARS: usize = 600;
const DISCUSSION_QUERY_TOPICS: usize = 3;
const DISCUSSION_QUERY_CHARS: usize = 200;
const SUMMARY_MIN_CHARS: usize = 20;
const SUMMARY_TOPICS: usize = 5;
const SUMMARY_TOPIC_CHARS: usize = 150;

/// Page of a reference: a page number or a placeholder such as `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PageRef {
    Number(u32),
    Text(String),
}

/// One excerpt offered to the model as exercise material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReferenceChunk {
    pub source: String,
    pub page: PageRef,
    pub excerpt: String,
}

impl ReferenceChunk {
    fn placeholder(source: &str, excerpt: impl Into<String>) -> Self {
        Self {
            source: source.to_string(),
            page: PageRef::Text("-".to_string()),
            excerpt: excerpt.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayloadMetadata {
    pub total_chunks: usize,
    pub sources_count: usize,
    pub conversation_messages: usize,
}

/// Material handed to the model to write exercises.
#[derive(Debug, Clone, Serialize)]
pub struct ExercisePayload {
    pub topic: String,
    pub participants: Vec<String>,
    pub num_participants: usize,
    pub conversation_history: String,
    pub recent_topics_discussed: String,
    pub sources_available: Vec<String>,
    pub instructions: String,
    pub reference_chunks: Vec<ReferenceChunk>,
    pub metadata: PayloadMetadata,
}

impl ExercisePayload {
    /// Pretty JSON with non-ASCII text kept as is.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// What the log says about the recent conversation.
#[derive(Debug, Default)]
struct ConversationContext {
    participants: Vec<String>,
    history: String,
    discussion_topics: Vec<String>,
}

/// Builds [`ExercisePayload`]s from the conversation log and the corpus.
pub struct ExerciseTool {
    instructions: String,
    keywords: KeywordExtractor,
}

impl ExerciseTool {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            keywords: KeywordExtractor::default(),
        }
    }

    pub async fn run(&self, ctx: &ToolContext, query: &str) -> Result<String> {
        self.build(ctx, query).await.to_json()
    }

    #[instrument(skip(self, ctx))]
    pub async fn build(&self, ctx: &ToolContext, query: &str) -> ExercisePayload {
        let topic = match query.trim() {
            "" => DEFAULT_TOPIC.to_string(),
            t => t.to_string(),
        };

        let context = self.read_context(ctx);
        let participants = if context.participants.is_empty() {
            vec![FALLBACK_PARTICIPANT.to_string()]
        } else {
            context.participants.clone()
        };

        let mut references = Vec::new();
        let chunks = match self.gather_chunks(ctx.index.as_ref(), &topic, &context).await {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Exercise retrieval failed: {}", e);
                references.push(ReferenceChunk::placeholder(
                    "erro",
                    format!("Falha ao consultar repositório: {}", e),
                ));
                Vec::new()
            }
        };

        let mut sources: IndexSet<String> = IndexSet::new();
        let mut seen: HashSet<ReferenceChunk> = HashSet::new();
        for chunk in chunks.iter().take(MAX_REFERENCES) {
            let text = chunk.content.trim();
            if text.is_empty() {
                continue;
            }
            let source = chunk
                .source_file
                .clone()
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
            let reference = ReferenceChunk {
                source: source.clone(),
                page: chunk
                    .page_number
                    .map(PageRef::Number)
                    .unwrap_or_else(|| PageRef::Text("?".to_string())),
                excerpt: excerpt(text),
            };
            if !seen.insert(reference.clone()) {
                continue;
            }
            references.push(reference);
            sources.insert(source);
        }

        debug!(
            "Exercise payload: {} participants, {} references from {} sources",
            participants.len(),
            references.len(),
            sources.len()
        );

        let metadata = PayloadMetadata {
            total_chunks: references.len(),
            sources_count: sources.len(),
            conversation_messages: context.history.lines().count(),
        };

        ExercisePayload {
            topic,
            num_participants: participants.len(),
            participants,
            conversation_history: if context.history.is_empty() {
                "Nenhum histórico de conversa disponível.".to_string()
            } else {
                context.history
            },
            recent_topics_discussed: topic_summary(&context.discussion_topics)
                .unwrap_or_else(|| "Nenhum tópico específico identificado.".to_string()),
            sources_available: if sources.is_empty() {
                vec!["Nenhuma fonte identificada".to_string()]
            } else {
                sources.into_iter().collect()
            },
            instructions: self.instructions.clone(),
            reference_chunks: if references.is_empty() {
                vec![ReferenceChunk::placeholder(
                    "N/A",
                    "Nenhum trecho disponível dos artigos.",
                )]
            } else {
                references
            },
            metadata,
        }
    }

    fn read_context(&self, ctx: &ToolContext) -> ConversationContext {
        let lines = match ctx.log.read_lines() {
            Ok(Some(lines)) => lines,
            Ok(None) => return ConversationContext::default(),
            Err(e) => {
                return ConversationContext {
                    history: format!("Erro ao ler histórico: {}", e),
                    ..Default::default()
                }
            }
        };

        let participants = participants(tail(&lines, ctx.limits.participant_window));

        let window = tail(&lines, ctx.limits.exercise_context_window);
        let discussion_topics = window
            .iter()
            .filter_map(|line| user_fields(line))
            .map(|(_, content)| content.trim().to_string())
            .collect();

        ConversationContext {
            participants,
            history: window.join("\n"),
            discussion_topics,
        }
    }

    /// Run the three retrieval strategies and merge them by chunk identity.
    async fn gather_chunks(
        &self,
        index: &dyn CorpusIndex,
        topic: &str,
        context: &ConversationContext,
    ) -> Result<Vec<DocumentChunk>> {
        let main_query = if context.history.is_empty() {
            topic.to_string()
        } else {
            self.keywords.expand(topic, &context.history)
        };
        let main = index.search(&main_query).await?;

        let discussion = match discussion_query(&context.discussion_topics) {
            Some(query) => index.search(&query).await?,
            None => Vec::new(),
        };

        let general = index.search(GENERAL_QUERY).await?;

        let mut merged: Vec<DocumentChunk> = Vec::new();
        let batches = [
            (main, MAIN_RESULTS),
            (discussion, DISCUSSION_RESULTS),
            (general, GENERAL_RESULTS),
        ];
        for (batch, take) in batches {
            for chunk in batch.into_iter().take(take) {
                if !merged.contains(&chunk) {
                    merged.push(chunk);
                }
            }
        }
        Ok(merged)
    }
}

fn tail(lines: &[String], n: usize) -> &[String] {
    &lines[lines.len().saturating_sub(n)..]
}

/// `(username, content)` of a user line.
fn user_fields(line: &str) -> Option<(&str, &str)> {
    let (role, username, content) = split_fields(line)?;
    match role.parse::<Role>() {
        Ok(Role::User) => Some((username, content)),
        _ => None,
    }
}

fn participants(lines: &[String]) -> Vec<String> {
    let mut names: IndexSet<String> = IndexSet::new();
    for (username, _) in lines.iter().filter_map(|line| user_fields(line)) {
        let name = match username.trim() {
            "" => ANONYMOUS_PARTICIPANT,
            name => name,
        };
        names.insert(name.to_string());
    }
    names.into_iter().collect()
}

fn discussion_query(topics: &[String]) -> Option<String> {
    let recent = &topics[topics.len().saturating_sub(DISCUSSION_QUERY_TOPICS)..];
    let joined = recent.join(" ");
    if joined.trim().is_empty() {
        return None;
    }
    Some(truncate_chars(&joined, DISCUSSION_QUERY_CHARS))
}

fn topic_summary(topics: &[String]) -> Option<String> {
    let significant: Vec<&String> = topics
        .iter()
        .filter(|t| t.chars().count() > SUMMARY_MIN_CHARS)
        .collect();
    if significant.is_empty() {
        return None;
    }
    let recent = &significant[significant.len().saturating_sub(SUMMARY_TOPICS)..];
    Some(
        recent
            .iter()
            .map(|t| format!("- {}", truncate_chars(t, SUMMARY_TOPIC_CHARS)))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        format!("{}...", truncate_chars(text, EXCERPT_CHARS))
    } else {
        text.to_string()
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationLog, ConversationMessage};
    use crate::corpus::testing::{FailingIndex, StaticIndex, TableIndex};
    use std::sync::Arc;

    fn context_with(
        dir: &tempfile::TempDir,
        index: Arc<dyn CorpusIndex>,
        messages: &[ConversationMessage],
    ) -> ToolContext {
        let log = Arc::new(ConversationLog::new(dir.path().join("history.txt")));
        for message in messages {
            log.append(message).unwrap();
        }
        ToolContext::new(log, index, "Rubrica dos exercícios")
    }

    fn numbered_chunks(source: &str, count: u32) -> Vec<DocumentChunk> {
        (1..=count)
            .map(|page| DocumentChunk::new(format!("{} trecho {}", source, page), source, page))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_log_uses_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(StaticIndex::new(Vec::new()));
        let ctx = context_with(&dir, index.clone(), &[]);

        let payload = ExerciseTool::new("Rubrica").build(&ctx, "   ").await;
        assert_eq!(payload.topic, DEFAULT_TOPIC);
        assert_eq!(payload.participants, vec!["Grupo"]);
        assert_eq!(payload.num_participants, 1);
        assert_eq!(payload.conversation_history, "Nenhum histórico de conversa disponível.");
        assert_eq!(payload.recent_topics_discussed, "Nenhum tópico específico identificado.");
        assert_eq!(payload.sources_available, vec!["Nenhuma fonte identificada"]);
        assert_eq!(payload.reference_chunks.len(), 1);
        assert_eq!(payload.reference_chunks[0].source, "N/A");
        assert_eq!(payload.metadata.total_chunks, 0);
        assert_eq!(payload.metadata.conversation_messages, 0);

        // No history: the topic is searched as is and the discussion query is skipped
        assert_eq!(index.queries(), vec![DEFAULT_TOPIC, GENERAL_QUERY]);
    }

    #[tokio::test]
    async fn test_participants_and_discussion() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(StaticIndex::new(numbered_chunks("artigoA.pdf", 2)));
        let ctx = context_with(
            &dir,
            index.clone(),
            &[
                ConversationMessage::user("Ana", "O que é X?"),
                ConversationMessage::user("Pedro", "Como funciona a entropia cruzada na prática?"),
                ConversationMessage::assistant("Resposta longa do assistente sobre entropia."),
                ConversationMessage::user("", "Pergunta anônima sobre gradientes e entropia"),
                ConversationMessage::user("Ana", "Obrigada!"),
            ],
        );

        let payload = ExerciseTool::new("Rubrica").build(&ctx, "entropia").await;
        assert_eq!(payload.participants, vec!["Ana", "Pedro", "Usuário"]);
        assert_eq!(payload.num_participants, 3);
        assert_eq!(payload.metadata.conversation_messages, 5);
        assert_eq!(
            payload.recent_topics_discussed,
            "- Como funciona a entropia cruzada na prática?\n\
             - Pergunta anônima sobre gradientes e entropia"
        );
        assert_eq!(payload.instructions, "Rubrica");

        let queries = index.queries();
        assert_eq!(queries.len(), 3);
        assert!(queries[0].starts_with("entropia entropia"));
        assert_eq!(
            queries[1],
            "Como funciona a entropia cruzada na prática? Pergunta anônima sobre gradientes e entropia Obrigada!"
        );
        assert_eq!(queries[2], GENERAL_QUERY);

        // The same two chunks come back from every strategy
        assert_eq!(payload.reference_chunks.len(), 2);
        assert_eq!(payload.sources_available, vec!["artigoA.pdf"]);
        assert_eq!(payload.metadata.sources_count, 1);
    }

    #[tokio::test]
    async fn test_merge_caps_references() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(TableIndex {
            table: vec![
                (DEFAULT_TOPIC.to_string(), numbered_chunks("artigoA.pdf", 15)),
                (GENERAL_QUERY.to_string(), numbered_chunks("artigoB.pdf", 8)),
            ],
        });
        let ctx = context_with(&dir, index, &[]);

        let payload = ExerciseTool::new("Rubrica").build(&ctx, "").await;
        assert_eq!(payload.reference_chunks.len(), MAX_REFERENCES);
        assert_eq!(payload.metadata.total_chunks, MAX_REFERENCES);
        assert_eq!(payload.sources_available, vec!["artigoA.pdf", "artigoB.pdf"]);

        let from_a = payload
            .reference_chunks
            .iter()
            .filter(|r| r.source == "artigoA.pdf")
            .count();
        assert_eq!(from_a, MAIN_RESULTS);

        let unique: HashSet<_> = payload.reference_chunks.iter().collect();
        assert_eq!(unique.len(), payload.reference_chunks.len());
    }

    #[tokio::test]
    async fn test_excerpts_are_trimmed_and_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let long = "x".repeat(700);
        let index = Arc::new(StaticIndex::new(vec![
            DocumentChunk::new("   ", "artigoA.pdf", 1),
            DocumentChunk::new(format!("  {}  ", long), "artigoA.pdf", 2),
            DocumentChunk {
                content: "sem fonte".to_string(),
                source_file: None,
                page_number: None,
            },
        ]));
        let ctx = context_with(&dir, index, &[]);

        let payload = ExerciseTool::new("Rubrica").build(&ctx, "tema").await;
        assert_eq!(payload.reference_chunks.len(), 2);

        let first = &payload.reference_chunks[0];
        assert_eq!(first.page, PageRef::Number(2));
        assert_eq!(first.excerpt.chars().count(), EXCERPT_CHARS + 3);
        assert!(first.excerpt.ends_with("..."));

        let second = &payload.reference_chunks[1];
        assert_eq!(second.source, "desconhecido");
        assert_eq!(second.page, PageRef::Text("?".to_string()));
        assert_eq!(payload.sources_available, vec!["artigoA.pdf", "desconhecido"]);
    }

    #[tokio::test]
    async fn test_retrieval_failure_becomes_reference() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with(&dir, Arc::new(FailingIndex), &[ConversationMessage::user("Ana", "oi")]);

        let payload = ExerciseTool::new("Rubrica").build(&ctx, "tema").await;
        assert_eq!(payload.participants, vec!["Ana"]);
        assert_eq!(payload.reference_chunks.len(), 1);
        let reference = &payload.reference_chunks[0];
        assert_eq!(reference.source, "erro");
        assert_eq!(reference.page, PageRef::Text("-".to_string()));
        assert!(reference.excerpt.starts_with("Falha ao consultar repositório:"));
        assert_eq!(payload.metadata.total_chunks, 1);
        assert_eq!(payload.sources_available, vec!["Nenhuma fonte identificada"]);
    }

    #[tokio::test]
    async fn test_json_keeps_non_ascii_and_page_types() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(StaticIndex::new(vec![DocumentChunk::new("Conclusões", "artigoA.pdf", 4)]));
        let ctx = context_with(&dir, index, &[]);

        let json = ExerciseTool::new("Rubrica").run(&ctx, "conclusões").await.unwrap();
        assert!(json.contains("\"topic\": \"conclusões\""));
        assert!(json.contains("\"page\": 4"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["sources_count"], 1);
        assert_eq!(value["reference_chunks"][0]["source"], "artigoA.pdf");
    }

    #[test]
    fn test_topic_summary_window() {
        let topics: Vec<String> = (1..=8)
            .map(|i| format!("mensagem número {} com conteúdo suficiente", i))
            .chain(std::iter::once("curta".to_string()))
            .collect();
        let summary = topic_summary(&topics).unwrap();
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(lines.len(), SUMMARY_TOPICS);
        assert_eq!(lines[0], "- mensagem número 4 com conteúdo suficiente");

        assert_eq!(topic_summary(&["curta".to_string()]), None);

        let long = vec!["y".repeat(400)];
        assert_eq!(topic_summary(&long).unwrap().chars().count(), SUMMARY_TOPIC_CHARS + 2);
    }

    #[test]
    fn test_discussion_query() {
        assert_eq!(discussion_query(&[]), None);
        assert_eq!(discussion_query(&[" ".to_string(), "".to_string()]), None);

        let topics = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        assert_eq!(discussion_query(&topics).as_deref(), Some("b c d"));

        let long = vec!["z".repeat(300)];
        assert_eq!(discussion_query(&long).unwrap().chars().count(), DISCUSSION_QUERY_CHARS);
    }
}
