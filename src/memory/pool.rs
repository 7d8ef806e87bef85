//! 资源池：一次任务运行内的步骤结果
//!
//! 以步骤 ID 为键保存执行器的输出，供后续步骤按引用读取。条目只在步骤成功后写入，
//! 任务结束时清空；每次运行使用独立的池，不做并发控制。

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::StepError;

#[derive(Debug, Default, Clone)]
pub struct ResourcePool {
    resources: BTreeMap<String, Value>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入步骤结果；同一键重复写入视为调用方错误
    pub fn put(&mut self, step_id: impl Into<String>, value: Value) -> Result<(), StepError> {
        let step_id = step_id.into();
        if self.resources.contains_key(&step_id) {
            return Err(StepError::DuplicateResource(step_id));
        }
        tracing::debug!(step_id = %step_id, "resource added");
        self.resources.insert(step_id, value);
        Ok(())
    }

    pub fn get(&self, step_id: &str) -> Option<&Value> {
        self.resources.get(step_id)
    }

    /// 读取依赖；缺失时返回 UnresolvedDependency
    pub fn resolve(&self, step_id: &str) -> Result<&Value, StepError> {
        self.get(step_id)
            .ok_or_else(|| StepError::UnresolvedDependency(step_id.to_string()))
    }

    /// 按顺序解析一组引用，返回 (键, 值) 列表
    pub fn resolve_all<'a>(
        &'a self,
        step_ids: &'a [String],
    ) -> Result<Vec<(&'a str, &'a Value)>, StepError> {
        step_ids
            .iter()
            .map(|id| self.resolve(id).map(|v| (id.as_str(), v)))
            .collect()
    }

    pub fn all(&self) -> &BTreeMap<String, Value> {
        &self.resources
    }

    pub fn clear(&mut self) {
        self.resources.clear();
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_after_put() {
        let mut pool = ResourcePool::new();
        pool.put("step_1", json!({"id": 7})).unwrap();
        assert_eq!(pool.get("step_1"), Some(&json!({"id": 7})));
    }

    #[test]
    fn test_get_before_put_is_absent() {
        let pool = ResourcePool::new();
        assert!(pool.get("step_1").is_none());
        assert!(matches!(
            pool.resolve("step_1"),
            Err(StepError::UnresolvedDependency(ref k)) if k == "step_1"
        ));
    }

    #[test]
    fn test_clear_empties_pool() {
        let mut pool = ResourcePool::new();
        pool.put("a", json!(1)).unwrap();
        pool.put("b", json!(2)).unwrap();
        assert_eq!(pool.all().len(), 2);
        pool.clear();
        assert!(pool.all().is_empty());
    }

    #[test]
    fn test_duplicate_put_is_flagged() {
        let mut pool = ResourcePool::new();
        pool.put("a", json!(1)).unwrap();
        let err = pool.put("a", json!(2)).unwrap_err();
        assert!(matches!(err, StepError::DuplicateResource(ref k) if k == "a"));
        // 原值保持不变
        assert_eq!(pool.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_resolve_all_stops_at_missing() {
        let mut pool = ResourcePool::new();
        pool.put("a", json!({"share_id": "x"})).unwrap();
        let ids = vec!["a".to_string(), "missing".to_string()];
        assert!(pool.resolve_all(&ids).is_err());
        let ok = pool.resolve_all(&ids[..1]).unwrap();
        assert_eq!(ok[0].0, "a");
    }
}
