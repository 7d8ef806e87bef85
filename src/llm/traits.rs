//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 HTTP / 脚本化 Mock）实现 LlmClient::complete。
//! 失败一律以 LlmError 返回，调用方将其视为「服务不可用」并自行降级。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::ChatResponse;
use crate::memory::Message;
use crate::tools::ToolDescriptor;

/// 客户端错误（网络、超时、非 2xx、响应无法解析）
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// 单次调用参数：温度、可选工具目录、超时
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    /// Some 时请求中附带工具目录，并允许模型自主选择是否调用
    pub tools: Option<Vec<ToolDescriptor>>,
    pub timeout: Duration,
}

impl CompletionOptions {
    pub fn new(temperature: f32, timeout: Duration) -> Self {
        Self {
            temperature,
            tools: None,
            timeout,
        }
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// LLM 客户端 trait：一次请求 / 一次响应
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<ChatResponse, LlmError>;
}
