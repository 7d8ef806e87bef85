//! 工具增强生成协议（显式状态机）
//!
//! 状态：AttemptWithTools -> (工具执行) -> FollowUp -> Done / Failed
//!                          \-> 失败或泄漏 -> AttemptWithoutTools -> Done / Failed
//!
//! 工具只在第一次调用时开放。后续调用若仍带回工具请求，在 `max_tool_calls` 轮次预算内继续执行，
//! 预算耗尽后忽略这些请求。每条降级路径都只会进入 AttemptWithoutTools，且不会再回到带工具的尝试，
//! 因此一次生成最多发起 `max_tool_calls + 2` 次模型调用。

use std::sync::Arc;

use crate::generation::{
    contains_dsml_function_calls, extract_content, GenerationError, GenerationPolicy, LeakDetector,
};
use crate::llm::{CompletionOptions, LlmClient};
use crate::memory::{Message, ToolCallRequest};
use crate::tools::ToolExecutor;

#[derive(Debug)]
enum State {
    AttemptWithTools,
    /// 工具结果已写入对话，等待模型给出最终内容
    FollowUp,
    AttemptWithoutTools,
    Done(String),
    Failed(GenerationError),
}

/// 工具增强生成器：持有模型客户端、工具执行器与策略
pub struct ToolAugmentedGenerator {
    llm: Arc<dyn LlmClient>,
    tools: ToolExecutor,
    policy: GenerationPolicy,
    leak_detector: LeakDetector,
}

impl ToolAugmentedGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolExecutor, policy: GenerationPolicy) -> Self {
        Self {
            llm,
            tools,
            policy,
            leak_detector: contains_dsml_function_calls,
        }
    }

    pub fn with_leak_detector(mut self, detector: LeakDetector) -> Self {
        self.leak_detector = detector;
        self
    }

    pub fn policy(&self) -> &GenerationPolicy {
        &self.policy
    }

    pub fn llm(&self) -> Arc<dyn LlmClient> {
        self.llm.clone()
    }

    /// 是否向模型开放工具（注册表非空、预算未用尽、按概率抽中）
    fn offer_tools(&self, remaining: u32) -> bool {
        self.tools.has_tools() && remaining > 0 && rand::random::<f64>() < self.policy.use_tool_prob
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions::new(self.policy.temperature, self.policy.call_timeout)
    }

    /// 执行一次生成；返回非空文本或显式失败
    pub async fn generate(&self, messages: Vec<Message>) -> Result<String, GenerationError> {
        let mut transcript = messages;
        let mut remaining = self.policy.max_tool_calls;
        let mut state = if self.offer_tools(remaining) {
            State::AttemptWithTools
        } else {
            State::AttemptWithoutTools
        };

        loop {
            tracing::debug!(state = ?state, remaining, "generation state");
            state = match state {
                State::AttemptWithTools => self.attempt_with_tools(&mut transcript, &mut remaining).await,
                State::FollowUp => self.follow_up(&mut transcript, &mut remaining).await,
                State::AttemptWithoutTools => self.attempt_without_tools(&transcript).await,
                State::Done(text) => return Ok(text),
                State::Failed(e) => {
                    tracing::warn!(error = %e, "generation failed");
                    return Err(e);
                }
            };
        }
    }

    async fn attempt_with_tools(&self, transcript: &mut Vec<Message>, remaining: &mut u32) -> State {
        let options = self.options().with_tools(self.tools.describe_all());
        let response = match self.llm.complete(transcript, &options).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "tool-enabled call failed, retrying without tools");
                return State::AttemptWithoutTools;
            }
        };
        let Some(message) = response.first() else {
            tracing::warn!("tool-enabled call returned no choices, retrying without tools");
            return State::AttemptWithoutTools;
        };

        let calls = message.requested_tools().to_vec();
        if calls.is_empty() {
            return match extract_content(message) {
                Some(text) if (self.leak_detector)(&text) => {
                    tracing::warn!("tool syntax leaked into content, retrying without tools");
                    State::AttemptWithoutTools
                }
                Some(text) => State::Done(text),
                None => State::Failed(GenerationError::Empty),
            };
        }

        self.run_tools(transcript, &calls, remaining).await;
        State::FollowUp
    }

    /// 执行一轮工具调用并把请求与结果追加到对话
    async fn run_tools(&self, transcript: &mut Vec<Message>, calls: &[ToolCallRequest], remaining: &mut u32) {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            tracing::info!(tool = %call.function.name, "model requested tool");
            results.push(self.tools.invoke(call).await);
        }
        transcript.push(Message::tool_calls(calls.to_vec()));
        for (call, result) in calls.iter().zip(results) {
            transcript.push(Message::tool_result(call, result));
        }
        *remaining = remaining.saturating_sub(1);
    }

    async fn follow_up(&self, transcript: &mut Vec<Message>, remaining: &mut u32) -> State {
        let response = match self.llm.complete(transcript, &self.options()).await {
            Ok(r) => r,
            Err(e) => return State::Failed(GenerationError::ServiceUnavailable(e.to_string())),
        };
        let Some(message) = response.first() else {
            return State::Failed(GenerationError::Malformed(
                "no choices after tool results".to_string(),
            ));
        };

        let calls = message.requested_tools();
        if !calls.is_empty() {
            if *remaining > 0 {
                let calls = calls.to_vec();
                self.run_tools(transcript, &calls, remaining).await;
                return State::FollowUp;
            }
            tracing::warn!(requested = calls.len(), "tool budget exhausted, ignoring further tool requests");
        }

        match extract_content(message) {
            Some(text) if (self.leak_detector)(&text) => {
                tracing::warn!("tool syntax leaked after tool round, retrying without tools");
                State::AttemptWithoutTools
            }
            Some(text) => State::Done(text),
            None => State::Failed(GenerationError::Empty),
        }
    }

    async fn attempt_without_tools(&self, transcript: &[Message]) -> State {
        let response = match self.llm.complete(transcript, &self.options()).await {
            Ok(r) => r,
            Err(e) => return State::Failed(GenerationError::ServiceUnavailable(e.to_string())),
        };
        let Some(message) = response.first() else {
            return State::Failed(GenerationError::Malformed("no choices".to_string()));
        };
        match extract_content(message) {
            // 已无可降级的路径
            Some(text) if (self.leak_detector)(&text) => State::Failed(GenerationError::LeakedToolSyntax),
            Some(text) => State::Done(text),
            None => State::Failed(GenerationError::Empty),
        }
    }
}
