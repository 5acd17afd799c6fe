use crate::core::conversation::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::tools::{ToolCall, ToolDefinition};
use crate::domain::ports::{ChatTransport, ConfigProvider};
use crate::utils::error::{ProjectError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.cohere.com";
pub const DEFAULT_MODEL: &str = "command-r-plus-08-2024";

#[derive(Debug, Clone)]
pub struct CohereSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub json_response_format: bool,
}

impl CohereSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            endpoint: config.model_endpoint().trim_end_matches('/').to_string(),
            api_key: config.api_key().to_string(),
            model: config.model_name().to_string(),
            timeout: Duration::from_secs(config.request_timeout_secs()),
            json_response_format: config.json_response_format(),
        }
    }
}

#[derive(Serialize)]
struct CohereChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct CohereChatReply {
    #[serde(default)]
    finish_reason: Option<String>,
    message: CohereReplyMessage,
}

#[derive(Debug, Deserialize)]
struct CohereReplyMessage {
    #[serde(default)]
    content: Option<Vec<CohereContent>>,
    #[serde(default)]
    tool_plan: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct CohereContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl From<CohereChatReply> for ChatResponse {
    fn from(reply: CohereChatReply) -> Self {
        let text: Vec<String> = reply
            .message
            .content
            .unwrap_or_default()
            .into_iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text)
            .collect();

        ChatResponse {
            text: if text.is_empty() { None } else { Some(text.concat()) },
            tool_plan: reply.message.tool_plan,
            tool_calls: reply.message.tool_calls.unwrap_or_default(),
            finish_reason: reply.finish_reason,
        }
    }
}

/// Cohere v2 chat API transport.
pub struct CohereClient {
    settings: CohereSettings,
    client: Client,
}

impl CohereClient {
    pub fn new(settings: CohereSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { settings, client })
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Self::new(CohereSettings::from_config(config))
    }

    fn chat_url(&self) -> String {
        format!("{}/v2/chat", self.settings.endpoint)
    }
}

#[async_trait]
impl ChatTransport for CohereClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = CohereChatBody {
            model: &self.settings.model,
            messages: &request.messages,
            tools: &request.tools,
            response_format: self
                .settings
                .json_response_format
                .then_some(ResponseFormat {
                    format_type: "json_object",
                }),
        };

        tracing::debug!("Making chat request to: {}", self.chat_url());
        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Chat response status: {}", status);

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProjectError::UpstreamStatus {
                status: status.as_u16(),
                message,
            });
        }

        let response_text = response.text().await?;
        let reply: CohereChatReply = serde_json::from_str(&response_text).map_err(|e| {
            tracing::debug!("Unparsable chat response: {}", response_text);
            ProjectError::upstream(format!("chat response is not valid: {}", e))
        })?;

        Ok(reply.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn settings(endpoint: String, json_response_format: bool) -> CohereSettings {
        CohereSettings {
            endpoint,
            api_key: "test-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(5),
            json_response_format,
        }
    }

    fn request(tools: Vec<ToolDefinition>) -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::System {
                    content: "system".to_string(),
                },
                ChatMessage::User {
                    content: "user".to_string(),
                },
            ],
            tools,
        }
    }

    #[tokio::test]
    async fn test_chat_returns_text_blocks() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v2/chat")
                .header("Authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "command-r-plus-08-2024", "response_format": {"type": "json_object"}}"#);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "id": "abc",
                    "finish_reason": "COMPLETE",
                    "message": {
                        "role": "assistant",
                        "content": [
                            {"type": "text", "text": "{\"name\":"},
                            {"type": "text", "text": "\"x\"}"}
                        ]
                    }
                }));
        });

        let client = CohereClient::new(settings(server.base_url(), true)).unwrap();
        let response = client.chat(&request(vec![])).await.unwrap();

        api_mock.assert();
        assert_eq!(response.text.as_deref(), Some("{\"name\":\"x\"}"));
        assert!(response.tool_calls.is_empty());
        assert_eq!(response.finish_reason.as_deref(), Some("COMPLETE"));
    }

    #[tokio::test]
    async fn test_chat_parses_tool_calls() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/v2/chat").body_contains("\"tools\"");
            then.status(200).json_body(serde_json::json!({
                "finish_reason": "TOOL_CALL",
                "message": {
                    "role": "assistant",
                    "tool_plan": "I will look up the motor driver.",
                    "tool_calls": [{
                        "id": "get_component_info_1",
                        "type": "function",
                        "function": {
                            "name": "get_component_info",
                            "arguments": "{\"component_name\":\"L298N Motor Driver\"}"
                        }
                    }]
                }
            }));
        });

        let client = CohereClient::new(settings(server.base_url(), false)).unwrap();
        let tools = crate::core::tools::Toolbox::default().definitions();
        let response = client.chat(&request(tools)).await.unwrap();

        api_mock.assert();
        assert!(response.text.is_none());
        assert_eq!(response.tool_plan.as_deref(), Some("I will look up the motor driver."));
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].function.name, "get_component_info");
    }

    #[tokio::test]
    async fn test_chat_error_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/v2/chat");
            then.status(401).body("invalid api token");
        });

        let client = CohereClient::new(settings(server.base_url(), true)).unwrap();
        let err = client.chat(&request(vec![])).await.unwrap_err();

        api_mock.assert();
        match err {
            ProjectError::UpstreamStatus { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api token");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_invalid_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v2/chat");
            then.status(200).body("<html>gateway</html>");
        });

        let client = CohereClient::new(settings(server.base_url(), true)).unwrap();
        let err = client.chat(&request(vec![])).await.unwrap_err();

        assert!(err.is_upstream());
        assert!(matches!(err, ProjectError::UpstreamResponse { .. }));
    }

    #[test]
    fn test_body_omits_empty_tools() {
        let messages = request(vec![]).messages;
        let body = CohereChatBody {
            model: DEFAULT_MODEL,
            messages: &messages,
            tools: &[],
            response_format: None,
        };
        let value = serde_json::to_value(&body).unwrap();

        assert!(value.get("tools").is_none());
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0]["role"], "system");
    }
}
