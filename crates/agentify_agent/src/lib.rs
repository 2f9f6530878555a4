//! Agent dispatcher for Agentify.
//!
//! Wraps a tool-calling chat model around the five calendar and mail
//! capabilities. See [`Dispatcher::run`].

pub mod dispatcher;
pub mod llm;
pub mod prompt;
pub mod tools;
pub mod types;

pub use dispatcher::{Dispatcher, ITERATION_LIMIT_MESSAGE};
pub use llm::{AzureOpenAiClient, ChatModel};
pub use tools::{catalog, Toolbox};
pub use types::{AssistantTurn, ChatMessage, ToolCall, ToolDefinition};

#[cfg(any(test, feature = "mocks"))]
pub use llm::MockChatModel;
