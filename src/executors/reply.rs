//! 回帖执行器
//!
//! post_id 可以是字面 ID，也可以是前序步骤的 ID（取其结果中的 `id`）。引用解析不到、
//! 或帖子不存在都是终止性错误。回复作者不会与帖子作者相同；生成结果为空白时按输出格式错误终止。

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::{json, Value};

use crate::core::StepError;
use crate::executors::post::resource_info;
use crate::executors::{mismatched, now, AuthorSelector, StepExecutor};
use crate::generation::{GenerationError, ToolAugmentedGenerator};
use crate::memory::{Message, ResourcePool};
use crate::planner::{PostRef, Step, StepKind, REPLY};
use crate::store::{format_time, NewReply, Store};

pub struct ReplyExecutor {
    generator: Arc<ToolAugmentedGenerator>,
    store: Arc<dyn Store>,
    authors: Arc<AuthorSelector>,
    signatures: Vec<String>,
}

impl ReplyExecutor {
    pub fn new(
        generator: Arc<ToolAugmentedGenerator>,
        store: Arc<dyn Store>,
        authors: Arc<AuthorSelector>,
        signatures: Vec<String>,
    ) -> Self {
        Self {
            generator,
            store,
            authors,
            signatures,
        }
    }

    fn signature(&self) -> String {
        self.signatures
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

/// 把 post_id 解析为帖子 ID
fn resolve_post_id(post_ref: &PostRef, pool: &ResourcePool) -> Result<i64, StepError> {
    match post_ref {
        PostRef::Id(id) => Ok(*id),
        PostRef::Step(step_id) => pool
            .resolve(step_id)?
            .get("id")
            .and_then(Value::as_i64)
            .ok_or_else(|| StepError::UnresolvedDependency(format!("{step_id}.id"))),
    }
}

#[async_trait]
impl StepExecutor for ReplyExecutor {
    async fn execute(&self, step: &Step, pool: &ResourcePool) -> Result<Value, StepError> {
        let StepKind::Reply(params) = &step.kind else {
            return Err(mismatched(step, REPLY));
        };
        let post_id = resolve_post_id(&params.post_id, pool)?;
        let resources = pool.resolve_all(&params.use_resources)?;
        let post = self
            .store
            .post(post_id)?
            .ok_or_else(|| StepError::UnresolvedDependency(format!("post {post_id}")))?;

        let author = self.authors.select(Some(post.author.trim())).await?;

        let mut request = format!(
            "请回复以下帖子：\n标题：{}\n内容：{}\n发帖人：{}\n要求：\n1. 回复内容必须与帖子主题强相关\n2. 口语化表达，1-3句话即可\n3. 贴合「{author}」的昵称风格\n4. 回复内容必须是虚构的，不与现实对应\n5. 只返回回复内容，不要包含任何额外格式或说明",
            post.title, post.content, post.author
        );
        if !resources.is_empty() {
            request.push_str(&format!("\n6. 如果合适，可以在回复中提到以下资源：{}", resource_info(&resources)));
        }
        let messages = vec![
            Message::system(format!(
                "你是复古论坛的用户「{author}」，正在回复一个帖子。生成的内容应尽量与现实世界保持距离，避免提及真实的地点、人名、事件或品牌。"
            )),
            Message::user(request),
        ];

        // 生成协议返回的文本已去除首尾空白且非空；空白输出在协议内即报 Empty
        let content = match self.generator.generate(messages).await {
            Ok(text) => text,
            Err(GenerationError::Empty) => {
                return Err(StepError::MalformedOutput("reply content is empty".to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let reply = self.store.create_reply(&NewReply {
            content,
            author,
            signature: self.signature(),
            post_id,
            create_time: now(),
        })?;

        tracing::info!(step_id = %step.id, reply_id = reply.id, post_id, "reply created");
        Ok(json!({
            "id": reply.id,
            "content": reply.content,
            "author": reply.author,
            "post_id": reply.post_id,
            "create_time": format_time(&reply.create_time),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::test_support::{plain_generator, reusing_authors, store_with_board};
    use crate::llm::ScriptedLlmClient;
    use crate::planner::ReplyParams;
    use crate::store::{NewPost, SqliteStore};

    fn reply_step(post_id: PostRef) -> Step {
        Step {
            id: "s2".to_string(),
            kind: StepKind::Reply(ReplyParams {
                post_id,
                use_resources: vec![],
            }),
        }
    }

    fn executor(llm: Arc<ScriptedLlmClient>, store: Arc<SqliteStore>) -> ReplyExecutor {
        let authors = reusing_authors(llm.clone(), store.clone());
        ReplyExecutor::new(plain_generator(llm), store, authors, vec!["亲测有效！".to_string()])
    }

    fn seed_post(store: &SqliteStore, board_id: i64, author: &str) -> i64 {
        store
            .create_post(&NewPost {
                title: "脚本小技巧".to_string(),
                content: "用循环批量改名".to_string(),
                author: author.to_string(),
                board_id,
                create_time: now(),
            })
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_reply_to_post_from_earlier_step() {
        let (store, board_id) = store_with_board();
        let post_id = seed_post(&store, board_id, "老王");
        let llm = Arc::new(ScriptedLlmClient::new());
        // 唯一的已有作者是帖子作者，只能新建
        llm.push_text("运维达人");
        llm.push_text("  学到了，回去试试  ");
        let exec = executor(llm.clone(), store.clone());

        let mut pool = ResourcePool::new();
        pool.put("step_1", json!({ "id": post_id })).unwrap();
        let out = exec
            .execute(&reply_step(PostRef::Step("step_1".into())), &pool)
            .await
            .unwrap();

        assert_eq!(out["content"], "学到了，回去试试");
        assert_eq!(out["author"], "运维达人");
        assert_eq!(out["post_id"], post_id);
        assert!(llm.calls()[1].messages[1].content.contains("脚本小技巧"));
        assert_eq!(store.post(post_id).unwrap().unwrap().reply_count, 1);
    }

    #[tokio::test]
    async fn test_missing_step_reference_is_unresolved() {
        let (store, _) = store_with_board();
        let llm = Arc::new(ScriptedLlmClient::new());
        let exec = executor(llm.clone(), store);

        let err = exec
            .execute(&reply_step(PostRef::Step("step_1".into())), &ResourcePool::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::UnresolvedDependency(ref k) if k == "step_1"));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_post_is_unresolved() {
        let (store, _) = store_with_board();
        let llm = Arc::new(ScriptedLlmClient::new());
        let exec = executor(llm, store);

        let err = exec
            .execute(&reply_step(PostRef::Id(42)), &ResourcePool::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::UnresolvedDependency(_)));
    }

    #[tokio::test]
    async fn test_blank_reply_fails() {
        for blank in ["  \n ", "\u{3000}"] {
            let (store, board_id) = store_with_board();
            let post_id = seed_post(&store, board_id, "老王");
            seed_post(&store, board_id, "小李");
            let llm = Arc::new(ScriptedLlmClient::new());
            llm.push_text(blank);
            let exec = executor(llm, store.clone());

            let err = exec
                .execute(&reply_step(PostRef::Id(post_id)), &ResourcePool::new())
                .await
                .unwrap_err();
            assert!(matches!(err, StepError::MalformedOutput(_)), "{err:?}");
            assert_eq!(store.post(post_id).unwrap().unwrap().reply_count, 0);
        }
    }
}
