//! The tool-calling control loop.

use super::tools::{parse_query, tool_definitions, ToolContext};
use crate::config::{DEFAULT_MAX_TURNS, RECENT_CONTEXT_TURNS};
use crate::conversation::{ConversationMessage, Role};
use crate::error::Result;
use crate::llm::{AgentMessage, LanguageModel, ToolCall, ToolSpec};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where the loop is.
enum Step {
    /// Ask the model for the next reply.
    Llm,
    /// Run the requested calls, in order.
    ExecuteTools(Vec<ToolCall>),
    /// Final answer.
    Done(String),
}

/// Agent that alternates model turns with tool execution.
pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    tools: ToolContext,
    tool_specs: Vec<ToolSpec>,
    system_instruction: String,
    recent_context_turns: usize,
    max_turns: usize,
}

impl Orchestrator {
    /// Create an orchestrator with the default tool set.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        tools: ToolContext,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            model,
            tools,
            tool_specs: tool_definitions(),
            system_instruction: system_instruction.into(),
            recent_context_turns: RECENT_CONTEXT_TURNS,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    /// Set how many log turns are injected before every model call.
    pub fn with_recent_context_turns(mut self, turns: usize) -> Self {
        self.recent_context_turns = turns;
        self
    }

    pub fn tools(&self) -> &ToolContext {
        &self.tools
    }

    /// Run the loop on the caller's messages until the model answers.
    ///
    /// Only model errors propagate; tool failures become tool replies.
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    pub async fn run(&self, messages: Vec<AgentMessage>) -> Result<AgentResponse> {
        let mut state = messages;
        let mut records: Vec<ToolCallRecord> = Vec::new();
        let mut iterations = 0;
        let mut step = Step::Llm;

        loop {
            step = match step {
                Step::Llm => {
                    if iterations >= self.max_turns {
                        warn!("Agent stopped after {} model calls", iterations);
                        return Ok(AgentResponse {
                            content: turn_limit_message(self.max_turns),
                            tool_calls: records,
                            iterations,
                            hit_turn_limit: true,
                        });
                    }
                    iterations += 1;
                    debug!("Agent iteration {}", iterations);

                    let mut request = self.context_prefix();
                    request.extend(state.iter().cloned());

                    let reply = self.model.chat(&request, &self.tool_specs).await?;
                    state.push(AgentMessage::Assistant(reply.clone()));

                    if reply.has_tool_calls() {
                        Step::ExecuteTools(reply.tool_calls)
                    } else {
                        Step::Done(reply.content)
                    }
                }
                Step::ExecuteTools(calls) => {
                    if let Some(first) = calls.first() {
                        debug!(route = %first.name, calls = calls.len(), "Executing tool calls");
                    }
                    for call in &calls {
                        let record = self.execute_tool_call(call).await;
                        state.push(AgentMessage::tool(&call.id, &call.name, record.result.clone()));
                        records.push(record);
                    }
                    Step::Llm
                }
                Step::Done(content) => {
                    return Ok(AgentResponse {
                        content,
                        tool_calls: records,
                        iterations,
                        hit_turn_limit: false,
                    });
                }
            };
        }
    }

    /// System instruction followed by the most recent log turns.
    fn context_prefix(&self) -> Vec<AgentMessage> {
        let mut prefix = vec![AgentMessage::system(self.system_instruction.clone())];
        prefix.extend(
            self.tools
                .log
                .recent_messages(self.recent_context_turns)
                .into_iter()
                .map(log_turn_to_message),
        );
        prefix
    }

    async fn execute_tool_call(&self, call: &ToolCall) -> ToolCallRecord {
        info!("Agent calling tool: {} with args: {}", call.name, call.arguments);

        let query = parse_query(&call.arguments);
        let result = match self.tools.execute_named(&call.name, &query).await {
            Ok(output) => output,
            Err(e) => format!("Tool error: {}", e),
        };

        ToolCallRecord {
            name: call.name.clone(),
            id: call.id.clone(),
            arguments: call.arguments.clone(),
            result,
        }
    }
}

fn log_turn_to_message(message: ConversationMessage) -> AgentMessage {
    match message.role {
        Role::User if message.username.is_empty() => AgentMessage::user(message.content),
        Role::User => AgentMessage::user(format!("{}: {}", message.username, message.content)),
        Role::Assistant => AgentMessage::assistant(message.content),
    }
}

fn turn_limit_message(max_turns: usize) -> String {
    format!(
        "Não consegui concluir a resposta dentro do limite de {} chamadas ao modelo. \
         Tente reformular ou dividir a pergunta.",
        max_turns
    )
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls used.
    pub iterations: usize,
    /// Whether the run was cut off by the turn limit.
    pub hit_turn_limit: bool,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// Id of the originating call.
    pub id: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
