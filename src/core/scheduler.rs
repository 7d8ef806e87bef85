//! 任务调度器：编译计划，按顺序执行步骤，汇总结果
//!
//! 每次运行使用独立的资源池。未注册的步骤类型记录告警后跳过；任一执行器出错即终止整次运行，
//! 已累积的资源全部丢弃。每个步骤成功后固定休眠一段时间，给外部模型服务限流。

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::executors::ExecutorRegistry;
use crate::memory::ResourcePool;
use crate::planner::{Plan, PlanCompiler};

/// 对调用方可见的运行结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskOutcome {
    /// 各步骤结果，以步骤 ID 为键
    Success { result: Map<String, Value> },
    Error { message: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success { .. })
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "message": e.to_string() })
        })
    }
}

pub struct Scheduler {
    compiler: PlanCompiler,
    executors: ExecutorRegistry,
    step_delay: Duration,
}

impl Scheduler {
    pub fn new(compiler: PlanCompiler, executors: ExecutorRegistry, step_delay: Duration) -> Self {
        Self {
            compiler,
            executors,
            step_delay,
        }
    }

    pub fn executors(&self) -> &ExecutorRegistry {
        &self.executors
    }

    /// 运行一个任务；`extra_params` 合并进每个步骤的参数（同名键覆盖）
    pub async fn run(&self, description: &str, extra_params: Option<&Map<String, Value>>) -> TaskOutcome {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let run_id = &run_id[..8];
        tracing::info!(run_id = %run_id, task = %description, "task started");

        let plan = self.compiler.compile(description).await;
        let plan = match extra_params {
            Some(extra) if !extra.is_empty() => match plan.with_overrides(extra) {
                Ok(plan) => plan,
                Err(e) => {
                    tracing::error!(run_id = %run_id, error = %e, "parameter overrides invalidate plan");
                    return TaskOutcome::Error {
                        message: e.to_string(),
                    };
                }
            },
            _ => plan,
        };

        let outcome = self.execute_plan(&plan).await;
        match &outcome {
            TaskOutcome::Success { result } => {
                tracing::info!(run_id = %run_id, completed = result.len(), "task finished")
            }
            TaskOutcome::Error { message } => {
                tracing::error!(run_id = %run_id, error = %message, "task aborted")
            }
        }
        outcome
    }

    /// 执行已编译的计划
    pub async fn execute_plan(&self, plan: &Plan) -> TaskOutcome {
        let mut pool = ResourcePool::new();
        let outcome = match self.run_steps(plan, &mut pool).await {
            Ok(()) => TaskOutcome::Success {
                result: pool
                    .all()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            },
            Err(message) => TaskOutcome::Error { message },
        };
        pool.clear();
        outcome
    }

    async fn run_steps(&self, plan: &Plan, pool: &mut ResourcePool) -> Result<(), String> {
        for (index, step) in plan.steps.iter().enumerate() {
            let step_type = step.kind.type_name();
            let Some(executor) = self.executors.get(step_type) else {
                tracing::warn!(step_id = %step.id, step_type = %step_type, "no executor for step type, skipping");
                continue;
            };

            tracing::info!(step_id = %step.id, step_type = %step_type, index, total = plan.len(), "executing step");
            let value = executor
                .execute(step, pool)
                .await
                .map_err(|e| format!("step {} failed: {}", step.id, e))?;
            pool.put(step.id.clone(), value)
                .map_err(|e| format!("step {} failed: {}", step.id, e))?;

            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
        }
        Ok(())
    }
}
