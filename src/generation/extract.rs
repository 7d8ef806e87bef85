//! 响应内容提取与工具语法泄漏检测

use crate::llm::ResponseMessage;

/// 部分模型在拒绝结构化调用时会把工具调用语法原样写进正文，以此标记开头
pub const DSML_FUNCTION_CALLS: &str = "<｜DSML｜function_calls>";

/// 泄漏检测谓词；可在构造生成器时替换
pub type LeakDetector = fn(&str) -> bool;

pub fn contains_dsml_function_calls(text: &str) -> bool {
    text.contains(DSML_FUNCTION_CALLS)
}

/// 优先取正文；正文为空白时退回推理内容；两者皆空返回 None
pub fn extract_content(message: &ResponseMessage) -> Option<String> {
    let pick = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    pick(&message.content).or_else(|| pick(&message.reasoning_content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: Option<&str>, reasoning: Option<&str>) -> ResponseMessage {
        ResponseMessage {
            content: content.map(String::from),
            reasoning_content: reasoning.map(String::from),
            tool_calls: None,
        }
    }

    #[test]
    fn test_prefers_final_answer() {
        assert_eq!(extract_content(&msg(Some("X"), Some("Y"))).as_deref(), Some("X"));
    }

    #[test]
    fn test_falls_back_to_reasoning() {
        assert_eq!(extract_content(&msg(Some(""), Some("Y"))).as_deref(), Some("Y"));
        assert_eq!(extract_content(&msg(Some("  \n"), Some(" Y "))).as_deref(), Some("Y"));
        assert_eq!(extract_content(&msg(None, Some("Y"))).as_deref(), Some("Y"));
    }

    #[test]
    fn test_both_empty_is_none() {
        assert_eq!(extract_content(&msg(Some(""), Some(""))), None);
        assert_eq!(extract_content(&msg(None, None)), None);
    }

    #[test]
    fn test_dsml_sentinel() {
        assert!(contains_dsml_function_calls(
            "好的<｜DSML｜function_calls><｜DSML｜invoke name=\"get_forum_info\">"
        ));
        assert!(!contains_dsml_function_calls("function_calls"));
    }
}
