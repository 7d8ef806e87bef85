//! 自动发帖 / 回帖
//!
//! 在随机板块按主题表发若干新帖，再从时间窗口内的帖子里随机挑一些回复。
//! 每一项都构造成单步计划交给发帖 / 回帖执行器；单项失败只记录并跳过，不影响整批。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::AutopilotSection;
use crate::executors::StepExecutor;
use crate::memory::ResourcePool;
use crate::planner::{PostParams, PostRef, ReplyParams, Step, StepKind};
use crate::store::{Board, Store, StoreError};

/// 板块没有配置主题时使用
const DEFAULT_THEME: &str = "日常讨论";
const MAX_BOARDS: usize = 1000;

/// 一次批量运行的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AutopilotReport {
    pub posts_created: usize,
    pub posts_failed: usize,
    pub replies_created: usize,
    pub replies_failed: usize,
}

pub struct Autopilot {
    store: Arc<dyn Store>,
    post: Arc<dyn StepExecutor>,
    reply: Arc<dyn StepExecutor>,
    board_themes: HashMap<String, Vec<String>>,
    posts_per_run: usize,
    replies_per_run: usize,
    reply_window: chrono::Duration,
    step_delay: Duration,
}

impl Autopilot {
    pub fn new(
        store: Arc<dyn Store>,
        post: Arc<dyn StepExecutor>,
        reply: Arc<dyn StepExecutor>,
        cfg: &AutopilotSection,
        step_delay: Duration,
    ) -> Self {
        Self {
            store,
            post,
            reply,
            board_themes: cfg.board_themes.clone(),
            posts_per_run: cfg.posts_per_run,
            replies_per_run: cfg.replies_per_run,
            reply_window: chrono::Duration::hours(cfg.reply_window_hours),
            step_delay,
        }
    }

    /// 按配置的数量运行一批
    pub async fn run(&self) -> Result<AutopilotReport, StoreError> {
        self.run_with(self.posts_per_run, self.replies_per_run).await
    }

    pub async fn run_with(&self, posts: usize, replies: usize) -> Result<AutopilotReport, StoreError> {
        let mut report = AutopilotReport::default();
        self.create_posts(posts, &mut report).await?;
        self.create_replies(replies, &mut report).await?;
        tracing::info!(
            posts = report.posts_created,
            replies = report.replies_created,
            failed = report.posts_failed + report.replies_failed,
            "autopilot batch finished"
        );
        Ok(report)
    }

    fn pick_topic(&self, boards: &[Board]) -> Option<(i64, String)> {
        let mut rng = rand::thread_rng();
        let board = boards.choose(&mut rng)?;
        let theme = self
            .board_themes
            .get(&board.name)
            .and_then(|themes| themes.choose(&mut rng))
            .cloned()
            .unwrap_or_else(|| DEFAULT_THEME.to_string());
        Some((board.id, theme))
    }

    async fn create_posts(&self, count: usize, report: &mut AutopilotReport) -> Result<(), StoreError> {
        if count == 0 {
            return Ok(());
        }
        let boards = self.store.boards(MAX_BOARDS)?;
        if boards.is_empty() {
            tracing::warn!("no boards available, skipping posts");
            return Ok(());
        }

        for n in 0..count {
            let Some((board_id, theme)) = self.pick_topic(&boards) else {
                break;
            };
            let step = Step {
                id: format!("auto_post_{}", n + 1),
                kind: StepKind::Post(PostParams {
                    board_id,
                    title: theme,
                    use_resources: Vec::new(),
                }),
            };
            match self.post.execute(&step, &ResourcePool::new()).await {
                Ok(_) => {
                    report.posts_created += 1;
                    self.pause().await;
                }
                Err(e) => {
                    report.posts_failed += 1;
                    tracing::warn!(board_id, error = %e, "autopilot post failed");
                }
            }
        }
        Ok(())
    }

    async fn create_replies(&self, count: usize, report: &mut AutopilotReport) -> Result<(), StoreError> {
        if count == 0 {
            return Ok(());
        }
        let since = chrono::Utc::now().naive_utc() - self.reply_window;
        let mut recent = self.store.posts_since(since)?;
        if recent.is_empty() {
            tracing::warn!("no recent posts, skipping replies");
            return Ok(());
        }
        recent.shuffle(&mut rand::thread_rng());

        for post in recent.iter().take(count) {
            let step = Step {
                id: format!("auto_reply_{}", post.id),
                kind: StepKind::Reply(ReplyParams {
                    post_id: PostRef::Id(post.id),
                    use_resources: Vec::new(),
                }),
            };
            match self.reply.execute(&step, &ResourcePool::new()).await {
                Ok(_) => {
                    report.replies_created += 1;
                    self.pause().await;
                }
                Err(e) => {
                    report.replies_failed += 1;
                    tracing::warn!(post_id = post.id, error = %e, "autopilot reply failed");
                }
            }
        }
        Ok(())
    }

    async fn pause(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }
}
