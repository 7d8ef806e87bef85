//! 工具参数 JSON Schema 生成（schemars 自动生成）
//!
//! 参数结构体上的 `///` 注释即字段 description，serde 默认值即 schema 中的 default。
//! 生成结果内联全部子 schema，去掉 `$schema` / `title`，可直接放进 function calling 的 parameters。

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 生成某个参数结构体的 parameters schema
pub fn parameters_schema<T: JsonSchema>() -> Value {
    let settings = SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
        s.option_nullable = false;
        s.option_add_null_type = false;
    });
    let root = settings.into_generator().into_root_schema_for::<T>();
    let mut value = serde_json::to_value(root).unwrap_or_else(|_| serde_json::json!({"type": "object"}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
        obj.remove("definitions");
    }
    value
}

/// 把模型给出的参数解析为强类型结构体；失败时返回可读错误
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("参数错误: {e}"))
}
