//! 引擎构建器：从配置装配存储、模型客户端、工具、执行器与调度器
//!
//! 工具注册表与执行器注册表都在这里构建一次，再显式注入调度器与自动发帖器。

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::{Autopilot, Scheduler};
use crate::executors::{
    AuthorSelector, DiskFileExecutor, ExecutorRegistry, PostExecutor, ReplyExecutor, StepExecutor,
};
use crate::generation::{GenerationPolicy, ToolAugmentedGenerator};
use crate::llm::{LlmClient, OpenAiClient};
use crate::planner::{PlanCompiler, DISK_FILE, POST, REPLY};
use crate::store::{LocalFileStorage, SqliteStore, Store, StoreError};
use crate::tools::{builtin_registry, ToolExecutor, ToolRegistry};

/// 装配完成的引擎
pub struct Engine {
    pub scheduler: Scheduler,
    pub autopilot: Autopilot,
    pub tools: Arc<ToolRegistry>,
    pub store: Arc<dyn Store>,
}

pub struct EngineBuilder {
    config: AppConfig,
}

impl EngineBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 按配置打开数据库与模型客户端后装配
    pub fn build(&self) -> Result<Engine, StoreError> {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&self.config.app.database_path)?);
        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::from_config(&self.config.llm));
        tracing::info!(
            database = %self.config.app.database_path.display(),
            model = %self.config.llm.model,
            "engine configured"
        );
        Ok(self.build_with(llm, store))
    }

    /// 使用给定的模型客户端与存储装配（测试中注入脚本化客户端）
    pub fn build_with(&self, llm: Arc<dyn LlmClient>, store: Arc<dyn Store>) -> Engine {
        let tools = Arc::new(builtin_registry(store.clone()));
        let generator = Arc::new(self.build_generator(llm.clone(), tools.clone()));
        let authors = Arc::new(AuthorSelector::new(
            llm.clone(),
            store.clone(),
            &self.config.authors,
            Duration::from_secs(self.config.llm.timeouts.request),
        ));

        let files = Arc::new(LocalFileStorage::new(
            &self.config.app.storage_root,
            self.config.app.storage_url_prefix.clone(),
        ));
        let post: Arc<dyn StepExecutor> = Arc::new(PostExecutor::new(
            generator.clone(),
            store.clone(),
            authors.clone(),
        ));
        let reply: Arc<dyn StepExecutor> = Arc::new(ReplyExecutor::new(
            generator,
            store.clone(),
            authors,
            self.config.authors.signatures.clone(),
        ));

        let mut executors = ExecutorRegistry::new();
        executors.register(
            DISK_FILE,
            Arc::new(DiskFileExecutor::new(store.clone(), files, &self.config.disk)),
        );
        executors.register(POST, post.clone());
        executors.register(REPLY, reply.clone());

        let step_delay = Duration::from_millis(self.config.scheduler.step_delay_ms);
        let compiler = PlanCompiler::from_config(llm, &self.config.scheduler, &self.config.llm);
        let scheduler = Scheduler::new(compiler, executors, step_delay);
        let autopilot = Autopilot::new(store.clone(), post, reply, &self.config.autopilot, step_delay);

        Engine {
            scheduler,
            autopilot,
            tools,
            store,
        }
    }

    fn build_generator(&self, llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> ToolAugmentedGenerator {
        let executor = ToolExecutor::new(tools, self.config.generation.tool_timeout_secs);
        let policy = GenerationPolicy::from_config(&self.config.generation, &self.config.llm);
        ToolAugmentedGenerator::new(llm, executor, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlmClient;

    #[test]
    fn test_build_registers_everything() {
        let builder = EngineBuilder::new(AppConfig::default());
        let llm = Arc::new(ScriptedLlmClient::new());
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let engine = builder.build_with(llm, store);

        assert_eq!(engine.scheduler.executors().step_types(), vec!["disk_file", "post", "reply"]);
        assert_eq!(
            engine.tools.tool_names(),
            vec!["get_company_info", "get_forum_info", "get_map_location_info", "get_shop_info"]
        );
    }
}
