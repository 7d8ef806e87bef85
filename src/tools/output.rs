//! 工具结果信封：`{success, type, count, results}` / `{success, type, result}` / `{success: false, error}`

use serde::Serialize;
use serde_json::{json, Value};

/// 列表结果
pub fn list<T: Serialize>(kind: &str, items: &[T]) -> Result<String, String> {
    let results = serde_json::to_value(items).map_err(|e| e.to_string())?;
    Ok(json!({
        "success": true,
        "type": kind,
        "count": items.len(),
        "results": results,
    })
    .to_string())
}

/// 单条结果
pub fn single<T: Serialize>(kind: &str, item: &T) -> Result<String, String> {
    let result = serde_json::to_value(item).map_err(|e| e.to_string())?;
    Ok(json!({
        "success": true,
        "type": kind,
        "result": result,
    })
    .to_string())
}

pub fn failure(message: impl Into<String>) -> String {
    let message: String = message.into();
    json!({ "success": false, "error": message }).to_string()
}

/// 截断长文本，超过 max 个字符时追加 "..."
pub fn preview(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

/// 把结果里某个字符串字段截断为预览
pub fn truncate_field(value: &mut Value, field: &str, max: usize) {
    if let Some(Value::String(s)) = value.get_mut(field) {
        *s = preview(s, max);
    }
}
