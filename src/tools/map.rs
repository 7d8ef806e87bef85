//! 地图地名工具：查询地名或地名上的 AI 居民
//!
//! 模型经常不按声明的参数名调用本工具，因此执行前先做一次参数归一化：
//! 按 PARAM_ALIASES 改名，再用 KNOWN_PLACES 把地名换成 place_id，最后补默认的 query_type。

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::store::{Store, StoreError};
use crate::tools::schema::{parameters_schema, parse_args};
use crate::tools::{output, Tool};

/// 同义参数名 -> 声明的参数名
pub const PARAM_ALIASES: &[(&str, &str)] = &[("region_id", "place_id")];

/// 已知地名 -> place_id
pub const KNOWN_PLACES: &[(&str, i64)] = &[
    ("星云小区", 1),
    ("幻想公寓", 2),
    ("梦境城邦", 3),
    ("星湖别墅", 4),
];

/// 未知地名时返回的地名列表长度
const UNKNOWN_PLACE_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
enum MapQuery {
    Places,
    Ai,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct MapArgs {
    /// 查询类型，可以是：places（地名）、ai（AI信息）
    query_type: MapQuery,
    /// 地名ID，查询单个地名或该地名的AI时使用
    #[serde(default)]
    place_id: Option<i64>,
    /// AI ID，查询单个AI信息时使用
    #[serde(default)]
    ai_id: Option<i64>,
    /// 地名关键词，用于搜索特定地名
    #[serde(default)]
    keyword: Option<String>,
    /// 返回结果数量限制，默认10
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

fn known_place(name: &str) -> Option<i64> {
    let name = name.trim();
    KNOWN_PLACES
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, id)| *id)
}

fn place_lookup(place_id: i64) -> Value {
    json!({"query_type": "places", "place_id": place_id})
}

/// 参数归一化（校验之前执行）
pub fn normalize_args(args: Value) -> Value {
    let Value::Object(mut obj) = args else {
        return args;
    };

    for (alias, canonical) in PARAM_ALIASES {
        if let Some(v) = obj.remove(*alias) {
            if !obj.contains_key(*canonical) {
                tracing::debug!(from = %alias, to = %canonical, "map tool argument renamed");
                obj.insert(canonical.to_string(), v);
            }
        }
    }

    if let Some(name) = obj.get("place_name").and_then(Value::as_str) {
        tracing::debug!(place_name = %name, "map tool place_name resolved");
        return match known_place(name) {
            Some(id) => place_lookup(id),
            None => json!({"query_type": "places", "limit": UNKNOWN_PLACE_LIMIT}),
        };
    }

    if let Some(id) = obj.get("keyword").and_then(Value::as_str).and_then(known_place) {
        return place_lookup(id);
    }

    if !obj.contains_key("query_type") {
        obj.insert("query_type".to_string(), json!("places"));
    }
    Value::Object(obj)
}

pub struct MapLocationTool {
    store: Arc<dyn Store>,
}

impl MapLocationTool {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for MapLocationTool {
    fn name(&self) -> &str {
        "get_map_location_info"
    }

    fn description(&self) -> &str {
        "获取地名信息的工具，可以查询地名或AI信息"
    }

    fn parameters_schema(&self) -> Value {
        parameters_schema::<MapArgs>()
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let args: MapArgs = parse_args(normalize_args(args))?;
        let fail = |e: StoreError| format!("查询失败: {e}");
        let place_id = args.place_id.filter(|id| *id > 0);

        match args.query_type {
            MapQuery::Places => {
                if let Some(id) = place_id {
                    return match self.store.map_region(id).map_err(fail)? {
                        Some(place) => output::single("place", &place),
                        None => Err(format!("未找到ID为{id}的地名")),
                    };
                }
                let keyword = args.keyword.as_deref().filter(|k| !k.trim().is_empty());
                let places = self.store.map_regions(keyword, args.limit).map_err(fail)?;
                output::list("places", &places)
            }
            MapQuery::Ai => {
                if let Some(id) = args.ai_id.filter(|id| *id > 0) {
                    return match self.store.map_agent(id).map_err(fail)? {
                        Some(agent) => output::single("ai", &agent),
                        None => Err(format!("未找到ID为{id}的AI信息")),
                    };
                }
                let agents = self.store.map_agents(place_id, args.limit).map_err(fail)?;
                output::list("ai_list", &agents)
            }
        }
    }
}
