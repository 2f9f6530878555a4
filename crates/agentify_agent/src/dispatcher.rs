//! The tool-calling loop.
//!
//! A run moves through `AwaitingDecision -> ToolInvoked -> ObservingResult`
//! until the model answers or the decision budget is spent. The model is the
//! only moving part; tool execution and error conversion live in [`Toolbox`].

use agentify_common::{dispatch_error, AgentifyError, CredentialRecord, SessionFactory};
use agentify_gcal::CalendarSettings;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::llm::ChatModel;
use crate::prompt::system_prompt;
use crate::tools::{catalog, Toolbox};
use crate::types::{AssistantTurn, ChatMessage, ToolCall};

pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

#[derive(Debug)]
enum State {
    AwaitingDecision,
    ToolInvoked(Vec<ToolCall>),
    ObservingResult,
    Done(String),
}

pub struct Dispatcher {
    model: Arc<dyn ChatModel>,
    sessions: Arc<dyn SessionFactory>,
    settings: CalendarSettings,
    max_iterations: usize,
}

impl Dispatcher {
    pub fn new(
        model: Arc<dyn ChatModel>,
        sessions: Arc<dyn SessionFactory>,
        settings: CalendarSettings,
        max_iterations: usize,
    ) -> Self {
        Self {
            model,
            sessions,
            settings,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Runs one instruction for one caller, dated today in the configured zone.
    pub async fn run(
        &self,
        instruction: &str,
        credential: CredentialRecord,
    ) -> Result<String, AgentifyError> {
        let today = self.settings.today();
        self.run_on(instruction, credential, today).await
    }

    /// Same as [`Dispatcher::run`] with an explicit current date.
    #[instrument(skip_all, fields(today = %today))]
    pub async fn run_on(
        &self,
        instruction: &str,
        credential: CredentialRecord,
        today: NaiveDate,
    ) -> Result<String, AgentifyError> {
        let toolbox = Toolbox::new(
            Arc::clone(&self.sessions),
            credential,
            self.settings.clone(),
            today,
        );
        let tools = catalog();
        let mut messages = vec![
            ChatMessage::System(system_prompt(today)),
            ChatMessage::User(instruction.to_string()),
        ];
        let mut decisions = 0usize;
        let mut state = State::AwaitingDecision;

        loop {
            state = match state {
                State::AwaitingDecision if decisions >= self.max_iterations => {
                    warn!("Stopping after {} decisions without an answer", decisions);
                    State::Done(ITERATION_LIMIT_MESSAGE.to_string())
                }
                State::AwaitingDecision => {
                    decisions += 1;
                    let turn = self
                        .model
                        .complete(&messages, &tools)
                        .await
                        .map_err(|e| match e {
                            AgentifyError::Dispatch(_) => e,
                            other => dispatch_error(other),
                        })?;
                    match turn {
                        AssistantTurn::Answer(text) => State::Done(text),
                        AssistantTurn::ToolCalls { calls, .. } if calls.is_empty() => {
                            State::Done(String::new())
                        }
                        AssistantTurn::ToolCalls { content, calls } => {
                            messages.push(ChatMessage::Assistant {
                                content,
                                tool_calls: calls.clone(),
                            });
                            State::ToolInvoked(calls)
                        }
                    }
                }
                State::ToolInvoked(calls) => {
                    for call in calls {
                        let output = toolbox.invoke(&call).await;
                        debug!("Tool {} returned {} bytes", call.name, output.len());
                        messages.push(ChatMessage::Tool {
                            tool_call_id: call.id,
                            content: output,
                        });
                    }
                    State::ObservingResult
                }
                State::ObservingResult => State::AwaitingDecision,
                State::Done(answer) => {
                    info!("Dispatch finished after {} decision(s)", decisions);
                    return Ok(answer);
                }
            };
        }
    }
}
