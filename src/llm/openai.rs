//! Chat completions client for OpenAI-compatible endpoints.

use super::{AgentMessage, AssistantMessage, LanguageModel, ToolCall, ToolSpec};
use crate::config::LlmSettings;
use crate::error::{ColabError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Language model served through the chat completions API.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a model client from settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(&settings.api_base, &settings.api_key_env)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    #[instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len()))]
    async fn chat(&self, messages: &[AgentMessage], tools: &[ToolSpec]) -> Result<AssistantMessage> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(request_messages)
            .temperature(self.temperature);
        if !tools.is_empty() {
            builder.tools(tools.iter().map(to_tool_definition).collect::<Vec<_>>());
        }
        let request = builder
            .build()
            .map_err(|e| ColabError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ColabError::OpenAI(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ColabError::Agent("No response from model".to_string()))?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!("Model replied with {} tool call(s)", tool_calls.len());

        Ok(AssistantMessage {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

fn to_request_message(message: &AgentMessage) -> Result<ChatCompletionRequestMessage> {
    let built: ChatCompletionRequestMessage = match message {
        AgentMessage::System { content } => ChatCompletionRequestSystemMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(|e| ColabError::Agent(e.to_string()))?
            .into(),
        AgentMessage::User { content } => ChatCompletionRequestUserMessageArgs::default()
            .content(content.clone())
            .build()
            .map_err(|e| ColabError::Agent(e.to_string()))?
            .into(),
        AgentMessage::Assistant(reply) => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            if !reply.content.is_empty() {
                builder.content(reply.content.clone());
            }
            if reply.has_tool_calls() {
                builder.tool_calls(
                    reply
                        .tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect::<Vec<_>>(),
                );
            }
            builder
                .build()
                .map_err(|e| ColabError::Agent(e.to_string()))?
                .into()
        }
        AgentMessage::Tool {
            tool_call_id,
            content,
            ..
        } => ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(tool_call_id.clone())
            .content(content.clone())
            .build()
            .map_err(|e| ColabError::Agent(e.to_string()))?
            .into(),
    };
    Ok(built)
}

fn to_tool_definition(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition_conversion() {
        let spec = ToolSpec {
            name: "retriever_tool".to_string(),
            description: "Search the corpus".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        };
        let tool = to_tool_definition(&spec);
        assert_eq!(tool.function.name, "retriever_tool");
        assert_eq!(tool.function.description.as_deref(), Some("Search the corpus"));
    }

    #[test]
    fn test_every_message_kind_converts() {
        let messages = vec![
            AgentMessage::system("sys"),
            AgentMessage::user("Ana: oi"),
            AgentMessage::Assistant(AssistantMessage::with_tool_calls(vec![ToolCall::new(
                "c1",
                "conversation_history_tool",
                r#"{"query":"5"}"#,
            )])),
            AgentMessage::tool("c1", "conversation_history_tool", "user::Ana::oi"),
            AgentMessage::assistant("resposta"),
        ];

        for message in &messages {
            assert!(to_request_message(message).is_ok());
        }

        match to_request_message(&messages[3]).unwrap() {
            ChatCompletionRequestMessage::Tool(tool) => assert_eq!(tool.tool_call_id, "c1"),
            other => panic!("Expected tool message, got {:?}", other),
        }
    }
}
