//! 计划：数据模型与编译器

pub mod compiler;
pub mod types;

pub use compiler::{extract_plan_json, PlanCompiler};
pub use types::{
    DiskFileParams, Plan, PostParams, PostRef, ReplyParams, Step, StepKind, DEFAULT_POST_TITLE,
    DISK_FILE, POST, REPLY,
};
