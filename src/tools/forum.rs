//! 论坛信息工具：查询帖子、用户或板块

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::store::Store;
use crate::tools::schema::{parameters_schema, parse_args};
use crate::tools::{output, Tool};

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum ForumQuery {
    Posts,
    Users,
    Boards,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ForumArgs {
    /// 查询类型，可以是：posts（帖子）、users（用户）、boards（板块）
    query_type: ForumQuery,
    /// 搜索关键词，可选参数
    #[serde(default)]
    keyword: Option<String>,
    /// 返回结果数量限制，默认10
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

pub struct ForumInfoTool {
    store: Arc<dyn Store>,
}

impl ForumInfoTool {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ForumInfoTool {
    fn name(&self) -> &str {
        "get_forum_info"
    }

    fn description(&self) -> &str {
        "获取论坛信息的工具，可以查询帖子、用户或板块信息"
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<ForumArgs>()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: ForumArgs = parse_args(args)?;
        let keyword = args.keyword.as_deref().filter(|k| !k.trim().is_empty());
        let fail = |e: crate::store::StoreError| format!("查询失败: {e}");

        match args.query_type {
            ForumQuery::Posts => {
                let posts = self.store.search_posts(keyword, args.limit).map_err(fail)?;
                let results: Vec<Value> = posts
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "id": p.id,
                            "title": p.title,
                            "content": output::preview(&p.content, 100),
                            "author": p.author,
                            "board_name": p.board_name,
                            "create_time": crate::store::format_time(&p.create_time),
                            "reply_count": p.reply_count,
                        })
                    })
                    .collect();
                output::list("posts", &results)
            }
            ForumQuery::Users => {
                let stats = self.store.author_stats(keyword, args.limit).map_err(fail)?;
                output::list("users", &stats)
            }
            ForumQuery::Boards => {
                let boards = self.store.boards(args.limit).map_err(fail)?;
                output::list("boards", &boards)
            }
        }
    }
}
