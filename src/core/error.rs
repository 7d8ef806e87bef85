//! 步骤与计划错误类型
//!
//! StepError 是执行器的终止性错误：一旦返回，调度器放弃剩余步骤并以 error 状态收尾。
//! PlanError 只在计划编译内部出现，编译器会把它降级为默认计划。

use thiserror::Error;

use crate::generation::GenerationError;
use crate::store::{StorageError, StoreError};

/// 步骤执行失败（网络类失败已在生成协议内降级，到这里的都是终止性错误）
#[derive(Error, Debug)]
pub enum StepError {
    /// 引用了资源池中不存在的步骤结果
    #[error("Unresolved dependency: {0}")]
    UnresolvedDependency(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// 模型输出不符合预期格式（如帖子不足两行、回复为空）
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    /// 同一步骤 ID 重复写入资源池
    #[error("Duplicate resource: {0}")]
    DuplicateResource(String),
}

/// 计划解析 / 校验失败
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("No JSON object found in planner output")]
    NoJson,

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Plan has no steps")]
    Empty,

    #[error("Duplicate step id: {0}")]
    DuplicateStepId(String),

    #[error("Invalid params for step {step}: {reason}")]
    InvalidParams { step: String, reason: String },

    #[error("Planner unavailable: {0}")]
    ServiceUnavailable(String),
}
