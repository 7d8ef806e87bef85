//! 计划编译器：让模型把任务描述拆成步骤序列
//!
//! 从回复中提取第一个完整的 JSON 对象（优先 ```json 代码块）并解析为 Plan。
//! 服务不可用、找不到 JSON、JSON 非法或计划无效时，一律退回单步默认计划；compile 本身不会失败。

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::{LlmSection, SchedulerSection};
use crate::core::PlanError;
use crate::generation::extract_content;
use crate::llm::{CompletionOptions, LlmClient};
use crate::memory::Message;
use crate::planner::Plan;

const SYSTEM_PROMPT: &str = "你是一个AI任务调度器，负责将用户的任务分解为可执行的步骤序列。\
每个步骤应该是独立的，可以是以下类型之一：disk_file（生成网盘文件）、post（生成帖子）、reply（生成回复）。\
步骤之间可以有依赖关系，通过use_resources字段指定；reply 的 post_id 可以写成前面某个 post 步骤的 id。";

const EXAMPLE_PLAN: &str = r#"{
  "steps": [
    {
      "id": "step_1",
      "type": "disk_file",
      "params": {
        "content": "文件内容",
        "file_name": "文件名"
      }
    },
    {
      "id": "step_2",
      "type": "post",
      "params": {
        "board_id": 1,
        "title": "帖子标题",
        "use_resources": ["step_1"]
      }
    },
    {
      "id": "step_3",
      "type": "reply",
      "params": {
        "post_id": "step_2"
      }
    }
  ]
}"#;

/// 从模型输出中截取第一个完整的 JSON 对象文本
///
/// 优先在 ```json 代码块内查找；每个 `{` 都尝试读出一个完整的值，失败就换下一个。
pub fn extract_plan_json(output: &str) -> Option<&str> {
    if let Some(start) = output.find("```json") {
        let rest = &output[start + 7..];
        let block = rest.find("```").map(|end| &rest[..end]).unwrap_or(rest);
        if let Some(found) = first_object(block) {
            return Some(found);
        }
    }
    first_object(output)
}

fn first_object(text: &str) -> Option<&str> {
    text.match_indices('{').find_map(|(start, _)| {
        let rest = &text[start..];
        let mut values = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Object(_))) => Some(&rest[..values.byte_offset()]),
            _ => None,
        }
    })
}

/// 计划编译器
pub struct PlanCompiler {
    llm: Arc<dyn LlmClient>,
    temperature: f32,
    timeout: Duration,
    default_board_id: i64,
    fallback_title_chars: usize,
}

impl PlanCompiler {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            default_board_id: 1,
            fallback_title_chars: 50,
        }
    }

    pub fn from_config(llm: Arc<dyn LlmClient>, scheduler: &SchedulerSection, llm_cfg: &LlmSection) -> Self {
        Self {
            llm,
            temperature: scheduler.plan_temperature,
            timeout: Duration::from_secs(llm_cfg.timeouts.request),
            default_board_id: scheduler.default_board_id,
            fallback_title_chars: scheduler.fallback_title_chars,
        }
    }

    pub fn fallback(&self, description: &str) -> Plan {
        Plan::fallback(description, self.default_board_id, self.fallback_title_chars)
    }

    /// 编译任务描述；任何失败都退回默认计划
    pub async fn compile(&self, description: &str) -> Plan {
        match self.try_compile(description).await {
            Ok(plan) => {
                tracing::info!(steps = plan.len(), "execution plan compiled");
                plan
            }
            Err(e) => {
                tracing::warn!(error = %e, "plan compilation failed, using fallback plan");
                self.fallback(description)
            }
        }
    }

    async fn try_compile(&self, description: &str) -> Result<Plan, PlanError> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "请为以下任务生成执行步骤序列：{description}\n\n输出格式必须是JSON，包含steps数组，每个步骤包含id、type和params字段。例如：{EXAMPLE_PLAN}"
            )),
        ];
        let options = CompletionOptions::new(self.temperature, self.timeout);
        let response = self
            .llm
            .complete(&messages, &options)
            .await
            .map_err(|e| PlanError::ServiceUnavailable(e.to_string()))?;
        let content = response
            .first()
            .and_then(extract_content)
            .ok_or(PlanError::NoJson)?;
        let json = extract_plan_json(&content).ok_or(PlanError::NoJson)?;
        Plan::from_json(json)
    }
}
