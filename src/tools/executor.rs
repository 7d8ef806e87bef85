//! 工具执行器
//!
//! 持有 ToolRegistry 与单次调用超时。invoke 负责解析模型给出的 JSON 字符串参数、查找工具、
//! 在超时内执行；任何失败（参数非法、工具不存在、工具报错、超时）都折叠成 `{"success": false}` 文本，
//! 不会越过工具边界。每次调用输出结构化审计日志（JSON）。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::memory::ToolCallRequest;
use crate::tools::{output, ToolDescriptor, ToolRegistry};

/// 工具执行器：对每次调用施加超时，并把失败映射为失败信封
#[derive(Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行一次模型请求的工具调用，返回写入 transcript 的结果文本
    pub async fn invoke(&self, call: &ToolCallRequest) -> String {
        let tool_name = call.function.name.as_str();
        let args = match parse_arguments(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => {
                audit(tool_name, false, "bad_args", 0, &call.function.arguments);
                return output::failure(format!("工具参数格式错误 - {e}"));
            }
        };
        self.execute(tool_name, args).await
    }

    /// 按名称执行；超时或失败时返回失败信封；输出 JSON 审计日志
    pub async fn execute(&self, tool_name: &str, args: Value) -> String {
        let Some(tool) = self.registry.get(tool_name) else {
            audit(tool_name, false, "unknown_tool", 0, &args.to_string());
            return output::failure(format!("找不到工具 '{tool_name}'"));
        };

        let start = Instant::now();
        let preview = args.to_string();
        let result = timeout(self.timeout, tool.execute(args)).await;

        let outcome = match &result {
            Ok(Ok(_)) => "ok",
            Ok(Err(_)) => "error",
            Err(_) => "timeout",
        };
        audit(
            tool_name,
            outcome == "ok",
            outcome,
            start.elapsed().as_millis() as u64,
            &preview,
        );

        match result {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => output::failure(e),
            Err(_) => output::failure(format!("工具执行超时: {tool_name}")),
        }
    }

    pub fn describe_all(&self) -> Vec<ToolDescriptor> {
        self.registry.describe_all()
    }

    pub fn has_tools(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

/// 空字符串视为无参数
fn parse_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
}

fn audit(tool_name: &str, ok: bool, outcome: &str, duration_ms: u64, args: &str) {
    let audit = serde_json::json!({
        "event": "tool_audit",
        "tool": tool_name,
        "ok": ok,
        "outcome": outcome,
        "duration_ms": duration_ms,
        "args_preview": output::preview(args, 200),
    });
    tracing::info!(audit = %audit, "tool");
}
