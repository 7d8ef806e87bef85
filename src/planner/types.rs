//! 计划与步骤
//!
//! 模型给出的 JSON 计划先解析为宽松的原始结构，再按 `type` 转成带强类型参数的 StepKind。
//! 已知类型的参数不合法、步骤 ID 重复或没有步骤时整份计划判为无效。
//! 未知类型保留原始参数，由调度器跳过。

use std::collections::HashSet;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::core::PlanError;

pub const DISK_FILE: &str = "disk_file";
pub const POST: &str = "post";
pub const REPLY: &str = "reply";

pub const DEFAULT_POST_TITLE: &str = "未命名帖子";

/// 计划：有序步骤列表，创建后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: String,
    pub kind: StepKind,
}

/// 按步骤类型区分的参数
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    DiskFile(DiskFileParams),
    Post(PostParams),
    Reply(ReplyParams),
    /// 没有对应执行器的类型
    Other { type_name: String, params: Map<String, Value> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskFileParams {
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub file_name: Option<String>,
    #[serde(default = "default_extension")]
    pub file_extension: String,
    /// 指定访问码；为空时随机生成
    #[serde(default, deserialize_with = "lenient_opt_string", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostParams {
    #[serde(default = "default_board_id", deserialize_with = "lenient_i64")]
    pub board_id: i64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub use_resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyParams {
    pub post_id: PostRef,
    #[serde(default)]
    pub use_resources: Vec<String>,
}

/// 回复目标：字面帖子 ID，或前序步骤 ID（运行时从资源池取其 `id` 字段）
#[derive(Debug, Clone, PartialEq)]
pub enum PostRef {
    Id(i64),
    Step(String),
}

fn default_extension() -> String {
    "txt".to_string()
}

fn default_board_id() -> i64 {
    1
}

fn default_title() -> String {
    DEFAULT_POST_TITLE.to_string()
}

/// 接受数字或数字字符串
fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| de::Error::custom(format!("not an integer: {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("not an integer: {s}"))),
        other => Err(de::Error::custom(format!("not an integer: {other}"))),
    }
}

/// 接受字符串或数字；null 视为缺省
fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(de::Error::custom(format!("expected string, got {other}"))),
    }
}

impl<'de> Deserialize<'de> for PostRef {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        match Value::deserialize(d)? {
            Value::Number(n) => n
                .as_i64()
                .map(PostRef::Id)
                .ok_or_else(|| de::Error::custom(format!("invalid post id: {n}"))),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(de::Error::custom("empty post_id"));
                }
                Ok(match trimmed.parse::<i64>() {
                    Ok(id) => PostRef::Id(id),
                    Err(_) => PostRef::Step(trimmed.to_string()),
                })
            }
            other => Err(de::Error::custom(format!("invalid post_id: {other}"))),
        }
    }
}

impl Serialize for PostRef {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            PostRef::Id(id) => s.serialize_i64(*id),
            PostRef::Step(step) => s.serialize_str(step),
        }
    }
}

impl StepKind {
    pub fn type_name(&self) -> &str {
        match self {
            StepKind::DiskFile(_) => DISK_FILE,
            StepKind::Post(_) => POST,
            StepKind::Reply(_) => REPLY,
            StepKind::Other { type_name, .. } => type_name,
        }
    }

    /// 按类型解析参数；未知类型原样保留
    pub fn parse(type_name: &str, params: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let value = Value::Object(params);
        Ok(match type_name {
            DISK_FILE => StepKind::DiskFile(serde_json::from_value(value)?),
            POST => StepKind::Post(serde_json::from_value(value)?),
            REPLY => StepKind::Reply(serde_json::from_value(value)?),
            other => StepKind::Other {
                type_name: other.to_string(),
                params: match value {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
            },
        })
    }

    /// 参数的 JSON 形式
    pub fn params(&self) -> Map<String, Value> {
        let value = match self {
            StepKind::DiskFile(p) => serde_json::to_value(p),
            StepKind::Post(p) => serde_json::to_value(p),
            StepKind::Reply(p) => serde_json::to_value(p),
            StepKind::Other { params, .. } => return params.clone(),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    #[serde(default)]
    id: Value,
    #[serde(rename = "type", default)]
    step_type: String,
    #[serde(default)]
    params: Option<Map<String, Value>>,
}

impl Plan {
    /// 单步默认计划：在默认板块发一个以任务描述前缀为标题的帖子
    pub fn fallback(description: &str, board_id: i64, title_chars: usize) -> Self {
        let title: String = description.chars().take(title_chars).collect();
        Plan {
            steps: vec![Step {
                id: "step_1".to_string(),
                kind: StepKind::Post(PostParams {
                    board_id,
                    title,
                    use_resources: Vec::new(),
                }),
            }],
        }
    }

    /// 从 JSON 文本解析并校验
    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        let raw: RawPlan =
            serde_json::from_str(json).map_err(|e| PlanError::JsonParseError(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPlan) -> Result<Self, PlanError> {
        if raw.steps.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut seen = HashSet::new();
        let mut steps = Vec::with_capacity(raw.steps.len());
        for (index, step) in raw.steps.into_iter().enumerate() {
            let id = match step.id {
                Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => format!("step_{}", index + 1),
            };
            if !seen.insert(id.clone()) {
                return Err(PlanError::DuplicateStepId(id));
            }
            let kind = StepKind::parse(&step.step_type, step.params.unwrap_or_default()).map_err(|e| {
                PlanError::InvalidParams {
                    step: id.clone(),
                    reason: e.to_string(),
                }
            })?;
            steps.push(Step { id, kind });
        }
        Ok(Plan { steps })
    }

    /// 把额外参数合并进每个步骤（同名键以额外参数为准）并重新校验
    pub fn with_overrides(&self, extra: &Map<String, Value>) -> Result<Self, PlanError> {
        let mut steps = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let mut params = step.kind.params();
            for (k, v) in extra {
                params.insert(k.clone(), v.clone());
            }
            let kind = StepKind::parse(step.kind.type_name(), params).map_err(|e| {
                PlanError::InvalidParams {
                    step: step.id.clone(),
                    reason: e.to_string(),
                }
            })?;
            steps.push(Step {
                id: step.id.clone(),
                kind,
            });
        }
        Ok(Plan { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
