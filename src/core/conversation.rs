//! Tool-calling exchange with the model as an explicit state machine.
//!
//! ```text
//! AwaitingModel --tool calls--> ExecutingTools --rounds left--> AwaitingModel
//!       |                             |
//!       | text                        +--last round--> AwaitingFinalResponse --text--> Done
//!       v
//!      Done
//! ```

use crate::core::query::system_prompt;
use crate::core::tools::{ToolCall, ToolDefinition, Toolbox};
use crate::domain::model::RawProjectDescription;
use crate::domain::ports::{ChatTransport, ModelClient};
use crate::utils::error::{ProjectError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_plan: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

/// Transport-neutral request; the adapter adds model name and response format.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Empty when tools must not be offered.
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    pub text: Option<String>,
    pub tool_plan: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConversationState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    AwaitingFinalResponse,
    Done(String),
}

#[derive(Debug, Clone)]
pub struct ToolConversation {
    messages: Vec<ChatMessage>,
    state: ConversationState,
    rounds: u32,
    max_tool_rounds: u32,
}

impl ToolConversation {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tool_rounds: u32) -> Self {
        let state = if max_tool_rounds == 0 {
            ConversationState::AwaitingFinalResponse
        } else {
            ConversationState::AwaitingModel
        };

        Self {
            messages: vec![
                ChatMessage::System {
                    content: system.into(),
                },
                ChatMessage::User {
                    content: user.into(),
                },
            ],
            state,
            rounds: 0,
            max_tool_rounds,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// The request to send in the current state, `None` when no request is due.
    pub fn next_request(&self, tools: &[ToolDefinition]) -> Option<ChatRequest> {
        let tools = match self.state {
            ConversationState::AwaitingModel => tools.to_vec(),
            ConversationState::AwaitingFinalResponse => Vec::new(),
            _ => return None,
        };
        Some(ChatRequest {
            messages: self.messages.clone(),
            tools,
        })
    }

    pub fn on_response(&mut self, response: ChatResponse) -> Result<()> {
        let final_round = match self.state {
            ConversationState::AwaitingModel => false,
            ConversationState::AwaitingFinalResponse => true,
            ref state => {
                return Err(ProjectError::ProcessingError {
                    message: format!("model response received while in state {:?}", state),
                })
            }
        };

        let text = response.text.filter(|t| !t.trim().is_empty());

        if !response.tool_calls.is_empty() {
            if final_round {
                return Err(ProjectError::upstream(
                    "model requested tools after the last tool round",
                ));
            }
            tracing::info!("🔧 Model requested {} tool call(s)", response.tool_calls.len());
            self.messages.push(ChatMessage::Assistant {
                content: text,
                tool_plan: response.tool_plan,
                tool_calls: response.tool_calls.clone(),
            });
            self.state = ConversationState::ExecutingTools(response.tool_calls);
            return Ok(());
        }

        match text {
            Some(text) => {
                self.state = ConversationState::Done(text);
                Ok(())
            }
            None => Err(ProjectError::upstream(format!(
                "model returned neither text nor tool calls (finish reason: {})",
                response.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
    }

    pub fn execute_tools(&mut self, toolbox: &Toolbox) -> Result<()> {
        let calls = match &self.state {
            ConversationState::ExecutingTools(calls) => calls.clone(),
            state => {
                return Err(ProjectError::ProcessingError {
                    message: format!("no tool calls pending in state {:?}", state),
                })
            }
        };

        for call in &calls {
            let content = toolbox.execute(call);
            self.messages.push(ChatMessage::Tool {
                tool_call_id: call.id.clone(),
                content,
            });
        }

        self.rounds += 1;
        self.state = if self.rounds < self.max_tool_rounds {
            ConversationState::AwaitingModel
        } else {
            ConversationState::AwaitingFinalResponse
        };
        Ok(())
    }

    pub fn into_final_text(self) -> Result<String> {
        match self.state {
            ConversationState::Done(text) => Ok(text),
            state => Err(ProjectError::ProcessingError {
                message: format!("conversation not finished (state {:?})", state),
            }),
        }
    }
}

/// Model Invocation Adapter driving a [`ToolConversation`] over any transport.
pub struct ToolCallingClient<T: ChatTransport> {
    transport: T,
    max_tool_rounds: u32,
    personality: Option<String>,
}

impl<T: ChatTransport> ToolCallingClient<T> {
    pub fn new(transport: T, max_tool_rounds: u32) -> Self {
        Self {
            transport,
            max_tool_rounds,
            personality: None,
        }
    }

    pub fn with_personality(mut self, personality: Option<String>) -> Self {
        self.personality = personality;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn converse(&self, materials_query: &str, tools: &Toolbox) -> Result<String> {
        let mut conversation = ToolConversation::new(
            system_prompt(self.personality.as_deref()),
            materials_query,
            self.max_tool_rounds,
        );
        let definitions = tools.definitions();

        loop {
            match conversation.state() {
                ConversationState::AwaitingModel | ConversationState::AwaitingFinalResponse => {
                    let request = conversation
                        .next_request(&definitions)
                        .ok_or_else(|| ProjectError::ProcessingError {
                            message: "no request available for the current state".to_string(),
                        })?;
                    tracing::debug!(
                        "Sending chat request ({} messages, {} tools)",
                        request.messages.len(),
                        request.tools.len()
                    );
                    let response = self.transport.chat(&request).await?;
                    conversation.on_response(response)?;
                }
                ConversationState::ExecutingTools(_) => conversation.execute_tools(tools)?,
                ConversationState::Done(_) => break,
            }
        }

        tracing::debug!("Conversation finished after {} tool round(s)", conversation.rounds());
        conversation.into_final_text()
    }
}

#[async_trait]
impl<T: ChatTransport> ModelClient for ToolCallingClient<T> {
    async fn fetch_project_description(
        &self,
        materials_query: &str,
        tools: &Toolbox,
    ) -> Result<RawProjectDescription> {
        let text = self.converse(materials_query, tools).await?;
        tracing::debug!("Raw model response: {}", text);
        RawProjectDescription::from_json_str(&text)
    }
}
