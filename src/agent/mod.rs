//! Agent system for answering questions about the corpus with tool calling.
//!
//! The [`Orchestrator`] runs the model in a loop, executing the tools it asks
//! for (corpus retrieval, the shared chat history, exercise material) until
//! the model produces a final answer.

mod exercise;
mod history;
mod keywords;
mod orchestrator;
mod retriever;
mod tools;

pub use exercise::{ExercisePayload, ExerciseTool, PageRef, PayloadMetadata, ReferenceChunk};
pub use history::HistoryTool;
pub use keywords::KeywordExtractor;
pub use orchestrator::{AgentResponse, Orchestrator, ToolCallRecord};
pub use retriever::{format_chunks, ParsedQuery, RetrieverTool, SourceMatcher};
pub use tools::{
    parse_query, tool_definitions, ToolContext, ToolKind, ToolLimits, INCORRECT_TOOL_NAME,
};
