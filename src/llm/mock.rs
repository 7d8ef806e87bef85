//! 脚本化 Mock LLM 客户端（用于测试，无需 API）
//!
//! 按入队顺序逐个返回预设响应；队列耗尽后返回 Transport 错误。每次调用都会记录收到的消息
//! 以及是否附带工具目录，便于断言协议的调用次数与 transcript 结构。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{ChatResponse, CompletionOptions, LlmClient, LlmError};
use crate::memory::Message;

/// 一次被记录的调用
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub offered_tools: bool,
    pub temperature: f32,
}

#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以一组响应初始化
    pub fn with_script(responses: impl IntoIterator<Item = Result<ChatResponse, LlmError>>) -> Self {
        let client = Self::new();
        for r in responses {
            client.push(r);
        }
        client
    }

    pub fn push(&self, response: Result<ChatResponse, LlmError>) {
        if let Ok(mut q) = self.script.lock() {
            q.push_back(response);
        }
    }

    /// 追加一个纯文本响应
    pub fn push_text(&self, content: impl Into<String>) {
        self.push(Ok(ChatResponse::text(content)));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<ChatResponse, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                offered_tools: options.tools.as_ref().is_some_and(|t| !t.is_empty()),
                temperature: options.temperature,
            });
        }
        let next = self.script.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| Err(LlmError::Transport("script exhausted".to_string())))
    }
}
