//! 发帖执行器
//!
//! 解析 use_resources，选作者，把资源信息写进提示词后走工具增强生成；
//! 生成文本第一行为标题、其余非空行为正文，不足两行则步骤失败。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::StepError;
use crate::executors::{mismatched, now, AuthorSelector, StepExecutor};
use crate::generation::ToolAugmentedGenerator;
use crate::memory::{Message, ResourcePool};
use crate::planner::{Step, StepKind, POST};
use crate::store::{format_time, NewPost, Store};

/// 板块不存在时提示词里使用的板块名
const FALLBACK_BOARD_NAME: &str = "技术讨论区";

pub struct PostExecutor {
    generator: Arc<ToolAugmentedGenerator>,
    store: Arc<dyn Store>,
    authors: Arc<AuthorSelector>,
}

impl PostExecutor {
    pub fn new(
        generator: Arc<ToolAugmentedGenerator>,
        store: Arc<dyn Store>,
        authors: Arc<AuthorSelector>,
    ) -> Self {
        Self {
            generator,
            store,
            authors,
        }
    }
}

/// 拆分生成文本：(标题, 正文)
pub fn split_post(text: &str) -> Result<(String, String), StepError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    match lines.split_first() {
        Some((title, body)) if !body.is_empty() => Ok((title.to_string(), body.join("\n"))),
        _ => Err(StepError::MalformedOutput(format!(
            "post needs a title line and a body, got {} non-empty line(s)",
            lines.len()
        ))),
    }
}

/// 把已解析的资源写成提示词片段；网盘分享给出分享号与密码，其他资源给出 JSON
pub(crate) fn resource_info(resources: &[(&str, &Value)]) -> String {
    let mut info = String::new();
    for (step_id, value) in resources {
        match value.get("share_id").and_then(Value::as_str) {
            Some(share_id) => {
                let password = value.get("password").and_then(Value::as_str).unwrap_or("");
                let file_name = value.get("file_name").and_then(Value::as_str).unwrap_or("");
                info.push_str(&format!(
                    "\n资源链接：分享号 {share_id}，密码 {password}，文件名 {file_name}"
                ));
            }
            None => info.push_str(&format!("\n资源（{step_id}）：{value}")),
        }
    }
    info
}

#[async_trait]
impl StepExecutor for PostExecutor {
    async fn execute(&self, step: &Step, pool: &ResourcePool) -> Result<Value, StepError> {
        let StepKind::Post(params) = &step.kind else {
            return Err(mismatched(step, POST));
        };
        let resources = pool.resolve_all(&params.use_resources)?;

        let author = self.authors.select(None).await?;
        let board_name = self
            .store
            .board(params.board_id)?
            .map(|b| b.name)
            .unwrap_or_else(|| FALLBACK_BOARD_NAME.to_string());
        let title = &params.title;

        let messages = vec![
            Message::system(format!(
                "你是复古论坛的用户「{author}」，在「{board_name}」板块发帖。生成的内容应尽量与现实世界保持距离，避免提及真实的地点、人名、事件或品牌。"
            )),
            Message::user(format!(
                "请发一个关于「{title}」的帖子，要求：\n1. 标题：{title}\n2. 内容：口语化，3-5句话，像真实用户提问/分享，贴合「{author}」昵称风格；\n3. 风格：接地气、有生活气息，符合现实，但内容中提到的地名与现实无关；\n4. 如果有以下资源，请在帖子中合理使用：{}\n5. 输出格式：先标题（换行）再内容，无多余字符。",
                resource_info(&resources)
            )),
        ];

        let generated = self.generator.generate(messages).await?;
        let (post_title, content) = split_post(&generated)?;

        let post = self.store.create_post(&NewPost {
            title: post_title,
            content,
            author,
            board_id: params.board_id,
            create_time: now(),
        })?;

        tracing::info!(step_id = %step.id, post_id = post.id, title = %post.title, "post created");
        Ok(json!({
            "id": post.id,
            "title": post.title,
            "content": post.content,
            "author": post.author,
            "board_id": post.board_id,
            "create_time": format_time(&post.create_time),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::test_support::{plain_generator, reusing_authors, store_with_board};
    use crate::llm::ScriptedLlmClient;
    use crate::planner::PostParams;

    fn post_step(board_id: i64, use_resources: &[&str]) -> Step {
        Step {
            id: "s1".to_string(),
            kind: StepKind::Post(PostParams {
                board_id,
                title: "scripting tip".to_string(),
                use_resources: use_resources.iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    fn executor(llm: Arc<ScriptedLlmClient>, store: Arc<crate::store::SqliteStore>) -> PostExecutor {
        let authors = reusing_authors(llm.clone(), store.clone());
        PostExecutor::new(plain_generator(llm), store, authors)
    }

    #[test]
    fn test_split_post() {
        let (title, body) = split_post("Title\nBody line 1\nBody line 2").unwrap();
        assert_eq!(title, "Title");
        assert_eq!(body, "Body line 1\nBody line 2");

        let (title, body) = split_post("\n  标题  \n\n正文\n").unwrap();
        assert_eq!((title.as_str(), body.as_str()), ("标题", "正文"));

        assert!(matches!(split_post("OnlyOneLine"), Err(StepError::MalformedOutput(_))));
        assert!(split_post("  \n \n").is_err());
    }

    #[test]
    fn test_resource_info_formats_shares() {
        let share = json!({"share_id": "Ab12Cd34", "password": "123456", "file_name": "tips.txt"});
        let other = json!({"id": 3});
        let info = resource_info(&[("step_1", &share), ("step_2", &other)]);
        assert!(info.contains("资源链接：分享号 Ab12Cd34，密码 123456，文件名 tips.txt"));
        assert!(info.contains("step_2"));
    }

    #[tokio::test]
    async fn test_post_persisted_with_split_text() {
        let (store, board_id) = store_with_board();
        let llm = Arc::new(ScriptedLlmClient::new());
        // 作者名 + 帖子正文
        llm.push_text("编程老陈");
        llm.push_text("Great Tip\nHere is how you script it.");
        let exec = executor(llm.clone(), store.clone());

        let out = exec.execute(&post_step(board_id, &[]), &ResourcePool::new()).await.unwrap();
        assert_eq!(out["title"], "Great Tip");
        assert_eq!(out["content"], "Here is how you script it.");
        assert_eq!(out["author"], "编程老陈");

        let id = out["id"].as_i64().unwrap();
        let saved = store.post(id).unwrap().unwrap();
        assert_eq!(saved.board_name, "技术讨论区");
        let prompt = &llm.calls()[1].messages;
        assert!(prompt[0].content.contains("编程老陈"));
        assert!(prompt[1].content.contains("scripting tip"));
    }

    #[tokio::test]
    async fn test_single_line_output_fails_without_persisting() {
        let (store, board_id) = store_with_board();
        let llm = Arc::new(ScriptedLlmClient::new());
        llm.push_text("编程老陈");
        llm.push_text("OnlyOneLine");
        let exec = executor(llm, store.clone());

        let err = exec.execute(&post_step(board_id, &[]), &ResourcePool::new()).await.unwrap_err();
        assert!(matches!(err, StepError::MalformedOutput(_)));
        assert!(store.search_posts(None, 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_resource_is_unresolved() {
        let (store, board_id) = store_with_board();
        let llm = Arc::new(ScriptedLlmClient::new());
        let exec = executor(llm.clone(), store);

        let err = exec
            .execute(&post_step(board_id, &["step_0"]), &ResourcePool::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::UnresolvedDependency(ref k) if k == "step_0"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_share_resource_embedded_in_prompt() {
        let (store, board_id) = store_with_board();
        let llm = Arc::new(ScriptedLlmClient::new());
        llm.push_text("编程老陈");
        llm.push_text("资源分享\n链接在这里");
        let exec = executor(llm.clone(), store);

        let mut pool = ResourcePool::new();
        pool.put(
            "step_1",
            json!({"share_id": "Ab12Cd34", "password": "654321", "file_name": "tips.txt"}),
        )
        .unwrap();
        exec.execute(&post_step(board_id, &["step_1"]), &pool).await.unwrap();

        assert!(llm.calls()[1].messages[1].content.contains("分享号 Ab12Cd34，密码 654321"));
    }

    #[tokio::test]
    async fn test_unknown_board_rejected_by_store() {
        let (store, _) = store_with_board();
        let llm = Arc::new(ScriptedLlmClient::new());
        llm.push_text("编程老陈");
        llm.push_text("标题\n正文");
        let exec = executor(llm, store);

        let err = exec.execute(&post_step(99, &[]), &ResourcePool::new()).await.unwrap_err();
        assert!(matches!(err, StepError::Persistence(_)));
    }
}
