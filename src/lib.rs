//! Weaver - 论坛内容生成编排器
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、任务调度器、自动发帖器、装配
//! - **executors**: 步骤执行器（网盘文件 / 发帖 / 回帖）与作者选择
//! - **generation**: 有界的工具增强生成协议
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / 脚本化 Mock）
//! - **memory**: 单次生成的对话记录、单次任务的资源池
//! - **observability**: tracing 初始化
//! - **planner**: 计划数据模型与计划编译器
//! - **store**: SQLite 持久化与本地文件存储
//! - **tools**: 工具注册表、执行器与四个查询工具

pub mod config;
pub mod core;
pub mod executors;
pub mod generation;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod planner;
pub mod store;
pub mod tools;

pub use crate::core::{Engine, EngineBuilder, Scheduler, TaskOutcome};
