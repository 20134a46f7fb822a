//! Collaborative chat session.
//!
//! Participants post into the shared log; a message mentioning the assistant
//! also runs the agent and logs its answer.

use crate::agent::{AgentResponse, Orchestrator};
use crate::conversation::{ConversationLog, ConversationMessage};
use crate::error::Result;
use crate::llm::AgentMessage;
use regex::Regex;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Outcome of posting a message.
#[derive(Debug)]
pub enum PostOutcome {
    /// Logged only; the assistant was not mentioned.
    Logged,
    /// The assistant answered (possibly with an error notice).
    Answered {
        reply: String,
        response: Option<AgentResponse>,
    },
}

impl PostOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            PostOutcome::Logged => None,
            PostOutcome::Answered { reply, .. } => Some(reply),
        }
    }
}

/// A shared chat room backed by the conversation log.
pub struct ChatRoom {
    agent: Orchestrator,
    log: Arc<ConversationLog>,
    mention: Regex,
}

impl ChatRoom {
    /// Create a room where `mention` (case-insensitive) summons the agent.
    pub fn new(agent: Orchestrator, mention: &str) -> Result<Self> {
        let mention = Regex::new(&format!("(?i){}", regex::escape(mention)))
            .map_err(|e| crate::error::ColabError::Config(format!("Invalid mention: {}", e)))?;
        let log = agent.tools().log.clone();
        Ok(Self { agent, log, mention })
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn mentions_assistant(&self, text: &str) -> bool {
        self.mention.is_match(text)
    }

    /// Post a message as `username`.
    #[instrument(skip(self, text))]
    pub async fn post(&self, username: &str, text: &str) -> Result<PostOutcome> {
        self.log.append(&ConversationMessage::user(username, text))?;

        if !self.mentions_assistant(text) {
            return Ok(PostOutcome::Logged);
        }

        self.answer(username, text).await
    }

    /// Post a message and have the assistant answer it, mentioned or not.
    #[instrument(skip(self, text))]
    pub async fn ask(&self, username: &str, text: &str) -> Result<PostOutcome> {
        self.log.append(&ConversationMessage::user(username, text))?;
        self.answer(username, text).await
    }

    async fn answer(&self, username: &str, text: &str) -> Result<PostOutcome> {
        let question = self.mention.replace_all(text, "");
        let question = question.trim();
        info!("{} asked the assistant", username);

        let prompt = if username.is_empty() {
            question.to_string()
        } else {
            format!("{}: {}", username, question)
        };

        let (reply, response) = match self.agent.run(vec![AgentMessage::user(prompt)]).await {
            Ok(response) => (response.content.clone(), Some(response)),
            Err(e) => {
                error!("Assistant failed: {}", e);
                (format!("Erro ao consultar o assistente: {}", e), None)
            }
        };

        self.log.append(&ConversationMessage::assistant(reply.clone()))?;
        Ok(PostOutcome::Answered { reply, response })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolContext;
    use crate::corpus::testing::StaticIndex;
    use crate::error::ColabError;
    use crate::llm::testing::ScriptedModel;
    use crate::llm::AssistantMessage;

    fn room(dir: &tempfile::TempDir, model: Arc<ScriptedModel>) -> ChatRoom {
        let log = Arc::new(ConversationLog::new(dir.path().join("history.txt")));
        let tools = ToolContext::new(log, Arc::new(StaticIndex::new(Vec::new())), "Rubrica");
        ChatRoom::new(Orchestrator::new(model, tools, "SYSTEM"), "@colaborai").unwrap()
    }

    #[tokio::test]
    async fn test_plain_message_is_only_logged() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(Vec::new()));
        let room = room(&dir, model.clone());

        let outcome = room.post("Ana", "bom dia").await.unwrap();
        assert!(outcome.reply().is_none());
        assert!(model.requests().is_empty());
        assert_eq!(room.log().tail(10).unwrap().unwrap(), vec!["user::Ana::bom dia"]);
    }

    #[tokio::test]
    async fn test_mention_runs_agent_and_logs_answer() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![AssistantMessage::text("X é um conceito.")]));
        let room = room(&dir, model.clone());

        let outcome = room.post("Ana", "@ColaborAI O que é X?").await.unwrap();
        assert_eq!(outcome.reply(), Some("X é um conceito."));

        assert_eq!(
            room.log().tail(10).unwrap().unwrap(),
            vec!["user::Ana::@ColaborAI O que é X?", "assistant::::X é um conceito."]
        );

        let request = &model.requests()[0];
        assert_eq!(request.last(), Some(&AgentMessage::user("Ana: O que é X?")));
        // The posted message is already in the log, so it also appears as context
        assert_eq!(request[1], AgentMessage::user("Ana: @ColaborAI O que é X?"));
    }

    #[tokio::test]
    async fn test_ask_answers_without_mention() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![AssistantMessage::text("Claro.")]));
        let room = room(&dir, model.clone());

        let outcome = room.ask("", "explique Y").await.unwrap();
        assert_eq!(outcome.reply(), Some("Claro."));
        assert_eq!(model.requests()[0].last(), Some(&AgentMessage::user("explique Y")));
        assert_eq!(room.log().tail(10).unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_model_failure_becomes_assistant_message() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::with_results(vec![Err(ColabError::OpenAI(
            "rate limited".to_string(),
        ))]));
        let room = room(&dir, model);

        let outcome = room.post("Pedro", "@colaborai resuma").await.unwrap();
        let reply = outcome.reply().unwrap();
        assert!(reply.starts_with("Erro ao consultar o assistente:"));
        assert!(reply.contains("rate limited"));

        let lines = room.log().tail(1).unwrap().unwrap();
        assert!(lines[0].starts_with("assistant::::Erro ao consultar o assistente:"));
    }
}
