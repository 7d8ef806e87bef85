//! 工具增强生成：一次生成 = 有界的模型调用序列，中间可穿插工具执行
//!
//! 对外只暴露 ToolAugmentedGenerator::generate，返回非空文本或显式的 GenerationError。

pub mod extract;
pub mod protocol;

use std::time::Duration;

use thiserror::Error;

use crate::config::{GenerationSection, LlmSection};

pub use extract::{contains_dsml_function_calls, extract_content, LeakDetector, DSML_FUNCTION_CALLS};
pub use protocol::ToolAugmentedGenerator;

/// 生成失败（协议内部已完成全部降级后的最终结果）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generative service unavailable: {0}")]
    ServiceUnavailable(String),

    /// 响应中没有任何候选
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Generated content is empty")]
    Empty,

    /// 禁用工具后模型仍以纯文本输出工具调用语法
    #[error("Model emitted tool-call syntax as plain text")]
    LeakedToolSyntax,
}

/// 生成策略
#[derive(Debug, Clone)]
pub struct GenerationPolicy {
    /// 每次生成开放工具的概率
    pub use_tool_prob: f64,
    pub max_tool_calls: u32,
    pub temperature: f32,
    /// 协议内每次模型调用的超时
    pub call_timeout: Duration,
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            use_tool_prob: 1.0,
            max_tool_calls: 2,
            temperature: 0.7,
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl GenerationPolicy {
    pub fn from_config(generation: &GenerationSection, llm: &LlmSection) -> Self {
        Self {
            use_tool_prob: generation.use_tool_prob,
            max_tool_calls: generation.max_tool_calls,
            temperature: llm.temperature,
            call_timeout: Duration::from_secs(llm.timeouts.tool),
        }
    }

    pub fn without_tools(mut self) -> Self {
        self.use_tool_prob = 0.0;
        self
    }
}
