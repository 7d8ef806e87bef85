//! 模型响应结构（OpenAI 兼容 chat/completions）
//!
//! 只保留编排器用到的字段：候选列表、正文、推理内容（reasoning_content）与工具调用请求。

use serde::{Deserialize, Serialize};

use crate::memory::ToolCallRequest;

/// 一次调用的完整响应：若干候选，编排器只取第一个
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: ResponseMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// 候选消息：要么有正文，要么有工具调用请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// 推理模型的思考过程；正文为空时作为备选
    #[serde(default)]
    pub reasoning_content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallRequest>>,
}

impl ResponseMessage {
    pub fn requested_tools(&self) -> &[ToolCallRequest] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

impl ChatResponse {
    fn single(message: ResponseMessage) -> Self {
        Self {
            choices: vec![Choice {
                message,
                finish_reason: None,
            }],
        }
    }

    /// 只有正文的响应
    pub fn text(content: impl Into<String>) -> Self {
        Self::single(ResponseMessage {
            content: Some(content.into()),
            ..Default::default()
        })
    }

    /// 正文 + 推理内容
    pub fn with_reasoning(content: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self::single(ResponseMessage {
            content: Some(content.into()),
            reasoning_content: Some(reasoning.into()),
            tool_calls: None,
        })
    }

    /// 请求工具调用的响应
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self::single(ResponseMessage {
            content: None,
            reasoning_content: None,
            tool_calls: Some(calls),
        })
    }

    /// 第一个候选
    pub fn first(&self) -> Option<&ResponseMessage> {
        self.choices.first().map(|c| &c.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reasoning_and_tool_calls() {
        let raw = r#"{
            "id": "x",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "reasoning_content": "thinking",
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_map_location_info", "arguments": "{\"place_name\":\"星云小区\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }"#;
        let resp: ChatResponse = serde_json::from_str(raw).unwrap();
        let msg = resp.first().unwrap();
        assert_eq!(msg.content, None);
        assert_eq!(msg.reasoning_content.as_deref(), Some("thinking"));
        assert_eq!(msg.requested_tools().len(), 1);
        assert_eq!(msg.requested_tools()[0].function.name, "get_map_location_info");
    }

    #[test]
    fn test_missing_choices_decodes_empty() {
        let resp: ChatResponse = serde_json::from_str(r#"{"error": "busy"}"#).unwrap();
        assert!(resp.first().is_none());
    }
}
