//! 步骤执行器：每种步骤类型一个处理器
//!
//! 执行器读取强类型参数与资源池，产生持久化副作用，并返回写入资源池的结果对象。
//! 返回的 StepError 都是终止性的，调度器会放弃剩余步骤。

pub mod author;
pub mod disk_file;
pub mod post;
pub mod reply;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::StepError;
use crate::memory::ResourcePool;
use crate::planner::Step;

pub use author::AuthorSelector;
pub use disk_file::DiskFileExecutor;
pub use post::{split_post, PostExecutor};
pub use reply::ReplyExecutor;

/// 步骤执行器 trait
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, step: &Step, pool: &ResourcePool) -> Result<Value, StepError>;
}

/// 执行器注册表：步骤类型 -> 执行器，进程启动时构建一次后注入调度器
#[derive(Default, Clone)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn StepExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, step_type: impl Into<String>, executor: Arc<dyn StepExecutor>) {
        let step_type = step_type.into();
        tracing::debug!(step_type = %step_type, "executor registered");
        self.executors.insert(step_type, executor);
    }

    pub fn get(&self, step_type: &str) -> Option<Arc<dyn StepExecutor>> {
        self.executors.get(step_type).cloned()
    }

    /// 已注册类型，按名称排序
    pub fn step_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.executors.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

/// 当前时间（UTC，无时区），与持久化层的时间列一致
pub(crate) fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// 参数类型与执行器不匹配
pub(crate) fn mismatched(step: &Step, expected: &str) -> StepError {
    StepError::InvalidParams(format!(
        "step {} has type {}, expected {}",
        step.id,
        step.kind.type_name(),
        expected
    ))
}
