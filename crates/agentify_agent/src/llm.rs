//! The chat-model seam and its Azure OpenAI implementation.

use agentify_common::{create_client, dispatch_error, AgentifyError};
use agentify_config::LlmConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::types::{AssistantTurn, ChatMessage, ToolCall, ToolDefinition};

/// Decides the next step of a conversation.
///
/// The only variation point of the dispatcher: production uses
/// [`AzureOpenAiClient`], tests script the decisions.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantTurn, AgentifyError>;
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Client for an Azure OpenAI chat-completions deployment.
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
    temperature: f32,
}

impl AzureOpenAiClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            api_key: api_key.into(),
            temperature,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, AgentifyError> {
        let http = create_client(config.timeout_secs)
            .map_err(|e| AgentifyError::Config(format!("building LLM HTTP client: {}", e)))?;
        Ok(Self::new(
            http,
            config.endpoint.clone(),
            config.deployment.clone(),
            config.api_version.clone(),
            config.api_key.clone(),
            config.temperature,
        ))
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    fn request_body(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Value {
        let mut body = json!({
            "messages": messages.iter().map(ChatMessage::to_json).collect::<Vec<_>>(),
            "temperature": self.temperature,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(ToolDefinition::to_json).collect());
            body["tool_choice"] = json!("auto");
        }
        body
    }
}

fn into_turn(response: CompletionResponse) -> Result<AssistantTurn, AgentifyError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| dispatch_error("model returned no choices"))?
        .message;

    let tool_calls = message.tool_calls.unwrap_or_default();
    if tool_calls.is_empty() {
        return Ok(AssistantTurn::Answer(message.content.unwrap_or_default()));
    }
    Ok(AssistantTurn::ToolCalls {
        content: message.content,
        calls: tool_calls
            .into_iter()
            .map(|c| ToolCall {
                id: c.id,
                name: c.function.name,
                arguments: c.function.arguments,
            })
            .collect(),
    })
}

#[async_trait]
impl ChatModel for AzureOpenAiClient {
    #[instrument(skip_all, fields(deployment = %self.deployment, messages = messages.len()))]
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantTurn, AgentifyError> {
        let body = self.request_body(messages, tools);
        debug!("Sending chat completion request");

        let response = self
            .http
            .post(self.url())
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| dispatch_error(format!("chat completion request failed: {}", e)))?;

        let status = response.status();
        let response_body: Value = response
            .json()
            .await
            .map_err(|e| dispatch_error(format!("unreadable chat completion response: {}", e)))?;

        if !status.is_success() {
            let message = response_body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error");
            return Err(dispatch_error(format!(
                "chat completion failed with status {}: {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: CompletionResponse = serde_json::from_value(response_body)
            .map_err(|e| dispatch_error(format!("unexpected chat completion shape: {}", e)))?;
        into_turn(parsed)
    }
}
