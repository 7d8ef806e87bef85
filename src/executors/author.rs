//! 作者选择：多数时候复用已有作者，否则让模型起一个新用户名
//!
//! 新名字与已有作者撞名时有限次重试；模型不可用时从基础名单里挑，名单用尽则退回 `用户NNNN`。

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::AuthorsSection;
use crate::core::StepError;
use crate::generation::extract_content;
use crate::llm::{CompletionOptions, LlmClient};
use crate::memory::Message;
use crate::store::Store;

const NAME_TEMPERATURE: f32 = 0.9;
/// 提示中列出的已有用户名上限
const PROMPT_EXISTING_LIMIT: usize = 10;

pub struct AuthorSelector {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn Store>,
    reuse_prob: f64,
    max_retries: u32,
    base_pool: Vec<String>,
    timeout: Duration,
}

impl AuthorSelector {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn Store>,
        cfg: &AuthorsSection,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            store,
            reuse_prob: cfg.reuse_prob,
            max_retries: cfg.max_retries,
            base_pool: cfg.base_pool.clone(),
            timeout,
        }
    }

    /// 选择作者；`exclude` 为不能复用的名字（如被回复帖子的作者）
    pub async fn select(&self, exclude: Option<&str>) -> Result<String, StepError> {
        let existing = self.store.distinct_authors()?;
        if !existing.is_empty() && rand::random::<f64>() < self.reuse_prob {
            if let Some(author) = pick_existing(&existing, exclude) {
                tracing::debug!(author = %author, "reusing existing author");
                return Ok(author);
            }
        }
        let author = self.create(&existing).await;
        tracing::info!(author = %author, "new author created");
        Ok(author)
    }

    async fn create(&self, existing: &[String]) -> String {
        let prompt = name_prompt(existing);
        let Some(mut name) = self.ask_model(&prompt).await else {
            return pool_fallback(&self.base_pool, existing);
        };
        let mut retries = 0;
        while existing.contains(&name) && retries < self.max_retries {
            tracing::debug!(name = %name, retries, "generated author name collides, retrying");
            if let Some(next) = self.ask_model(&prompt).await {
                name = next;
            }
            retries += 1;
        }
        if existing.contains(&name) {
            numbered_name()
        } else {
            name
        }
    }

    async fn ask_model(&self, prompt: &str) -> Option<String> {
        let options = CompletionOptions::new(NAME_TEMPERATURE, self.timeout);
        match self.llm.complete(&[Message::user(prompt)], &options).await {
            Ok(response) => response
                .first()
                .and_then(extract_content)
                .map(|name| name.trim_matches(|c: char| c == '"' || c == '“' || c == '”').trim().to_string())
                .filter(|name| !name.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "author name generation failed");
                None
            }
        }
    }
}

fn name_prompt(existing: &[String]) -> String {
    let avoid = if existing.is_empty() {
        "无".to_string()
    } else {
        existing
            .iter()
            .take(PROMPT_EXISTING_LIMIT)
            .cloned()
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(
        "生成一个复古论坛的用户名，要求：\n\
         1. 风格：接地气、生活化，符合2000-2010年论坛风格（如\"打工仔小李\"、\"编程老陈\"）；\n\
         2. 格式：2-4字，可带职业、身份或昵称（如\"运维达人\"、\"校园吃货\"）；\n\
         3. 唯一性：不要和以下现有用户名重复：{avoid}；\n\
         4. 输出：仅返回用户名，不要任何多余字符。"
    )
}

fn pick_existing(existing: &[String], exclude: Option<&str>) -> Option<String> {
    let candidates: Vec<&String> = existing
        .iter()
        .filter(|name| Some(name.as_str()) != exclude)
        .collect();
    candidates.choose(&mut rand::thread_rng()).map(|name| (*name).clone())
}

fn pool_fallback(base_pool: &[String], existing: &[String]) -> String {
    let available: Vec<&String> = base_pool.iter().filter(|name| !existing.contains(name)).collect();
    available
        .choose(&mut rand::thread_rng())
        .map(|name| (*name).clone())
        .unwrap_or_else(numbered_name)
}

fn numbered_name() -> String {
    format!("用户{}", rand::thread_rng().gen_range(1000..=9999))
}
