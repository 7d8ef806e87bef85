//! OpenAI 兼容 API 客户端
//!
//! 直接用 reqwest 调用 chat/completions 端点（SiliconFlow、DeepSeek 等），
//! 以便读取 `reasoning_content` 这类非标准字段。带工具时把 ToolDescriptor 转成 function-calling 格式，
//! 并设置 `tool_choice = "auto"`。

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::LlmSection;
use crate::llm::{ChatResponse, CompletionOptions, LlmClient, LlmError};
use crate::memory::Message;
use crate::tools::ToolDescriptor;

/// OpenAI 兼容客户端：持有 HTTP Client、端点、密钥与模型名
pub struct OpenAiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_url: &str, model: &str, api_key: &str, max_tokens: u32) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }

    pub fn from_config(cfg: &LlmSection) -> Self {
        Self::new(&cfg.api_url, &cfg.model, &cfg.resolve_api_key(), cfg.max_tokens)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(
        &'a self,
        messages: &'a [Message],
        options: &'a CompletionOptions,
    ) -> ChatRequest<'a> {
        let tools = options
            .tools
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|tools| tools.iter().map(WireTool::from).collect::<Vec<_>>());
        let tool_choice = tools.as_ref().map(|_| "auto");
        ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: self.max_tokens,
            tools,
            tool_choice,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<ChatResponse, LlmError> {
        let request = self.build_request(messages, options);
        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            with_tools = request.tools.is_some(),
            "sending chat completion"
        );

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(options.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(options.timeout)
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "chat completion returned error status");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

impl<'a> From<&'a ToolDescriptor> for WireTool<'a> {
    fn from(d: &'a ToolDescriptor) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: &d.name,
                description: &d.description,
                parameters: &d.parameters,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor {
            name: "get_forum_info".to_string(),
            description: "forum".to_string(),
            parameters: serde_json::json!({"type": "object"}),
        }
    }

    #[test]
    fn test_request_without_tools_omits_tool_fields() {
        let client = OpenAiClient::new("http://localhost/v1/chat/completions", "m", "k", 1000);
        let messages = vec![Message::user("hi")];
        let opts = CompletionOptions::new(0.7, Duration::from_secs(1));
        let json = serde_json::to_value(client.build_request(&messages, &opts)).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["max_tokens"], 1000);
        assert!(json.get("tools").is_none());
        assert!(json.get("tool_choice").is_none());
    }

    #[test]
    fn test_request_with_tools_uses_function_schema() {
        let client = OpenAiClient::new("http://localhost/v1/chat/completions", "m", "k", 1000);
        let messages = vec![Message::user("hi")];
        let opts = CompletionOptions::new(0.7, Duration::from_secs(1)).with_tools(vec![descriptor()]);
        let json = serde_json::to_value(client.build_request(&messages, &opts)).unwrap();
        assert_eq!(json["tool_choice"], "auto");
        assert_eq!(json["tools"][0]["type"], "function");
        assert_eq!(json["tools"][0]["function"]["name"], "get_forum_info");
        assert_eq!(json["tools"][0]["function"]["parameters"]["type"], "object");
    }

    #[tokio::test]
    async fn test_complete_parses_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Great Tip\nBody","reasoning_content":""}}]}"#)
            .create_async()
            .await;

        let url = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiClient::new(&url, "m", "test-key", 1000);
        let resp = client
            .complete(&[Message::user("hi")], &CompletionOptions::new(0.7, Duration::from_secs(5)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(resp.first().unwrap().content.as_deref(), Some("Great Tip\nBody"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async()
            .await;

        let url = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiClient::new(&url, "m", "k", 1000);
        let err = client
            .complete(&[Message::user("hi")], &CompletionOptions::new(0.7, Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_tools_are_sent_with_auto_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "tool_choice": "auto",
                "tools": [{"type": "function", "function": {"name": "get_forum_info"}}]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let url = format!("{}/v1/chat/completions", server.url());
        let client = OpenAiClient::new(&url, "m", "k", 1000);
        let opts = CompletionOptions::new(0.7, Duration::from_secs(5)).with_tools(vec![descriptor()]);
        let resp = client.complete(&[Message::user("hi")], &opts).await.unwrap();

        mock.assert_async().await;
        assert!(resp.first().is_none());
    }
}
