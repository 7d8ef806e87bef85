//! 网盘文件执行器：落盘文本并登记分享记录
//!
//! 分享号为字母数字随机串，撞号时重新生成（有次数上限）；访问码默认是纯数字。
//! 文件以独占方式新建，同名时追加分享号后缀；分享记录写库失败时只删除本次新建的文件。

use std::sync::Arc;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};

use crate::config::DiskSection;
use crate::core::StepError;
use crate::executors::{mismatched, now, StepExecutor};
use crate::memory::ResourcePool;
use crate::planner::{Step, StepKind, DISK_FILE};
use crate::store::{format_time, LocalFileStorage, NewDiskShare, Store};

const MAX_SHARE_ID_ATTEMPTS: usize = 16;

pub struct DiskFileExecutor {
    store: Arc<dyn Store>,
    files: Arc<LocalFileStorage>,
    share_id_length: usize,
    password_length: usize,
}

impl DiskFileExecutor {
    pub fn new(store: Arc<dyn Store>, files: Arc<LocalFileStorage>, cfg: &DiskSection) -> Self {
        Self {
            store,
            files,
            share_id_length: cfg.share_id_length.max(1),
            password_length: cfg.password_length.max(1),
        }
    }

    fn unique_share_id(&self) -> Result<String, StepError> {
        for _ in 0..MAX_SHARE_ID_ATTEMPTS {
            let candidate = alphanumeric(self.share_id_length);
            if !self.store.share_exists(&candidate)? {
                return Ok(candidate);
            }
            tracing::debug!(share_id = %candidate, "share id taken, regenerating");
        }
        Err(StepError::InvalidParams(format!(
            "no free share id after {MAX_SHARE_ID_ATTEMPTS} attempts"
        )))
    }
}

fn alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn digits(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn default_file_name() -> String {
    format!("ai-generated-{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

#[async_trait]
impl StepExecutor for DiskFileExecutor {
    async fn execute(&self, step: &Step, _pool: &ResourcePool) -> Result<Value, StepError> {
        let StepKind::DiskFile(params) = &step.kind else {
            return Err(mismatched(step, DISK_FILE));
        };
        if params.content.trim().is_empty() {
            return Err(StepError::InvalidParams("文件内容必填".to_string()));
        }

        let base_name = params
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(default_file_name);
        let extension = params.file_extension.trim().trim_start_matches('.');
        let file_name = if extension.is_empty() {
            base_name
        } else {
            format!("{base_name}.{extension}")
        };

        let share_id = self.unique_share_id()?;
        let password = params
            .password
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .unwrap_or_else(|| digits(self.password_length));

        // 只回滚本步骤自己新建的文件；同名旧文件不会被覆盖
        let stored = self.files.write_new(&file_name, &params.content, &share_id)?;
        let share = self.store.create_disk_share(&NewDiskShare {
            share_id,
            password,
            file_name: stored.name.clone(),
            file_path: stored.path.clone(),
            create_time: now(),
        });
        let share = match share {
            Ok(share) => share,
            Err(e) => {
                if let Err(cleanup) = self.files.remove(&stored.name) {
                    tracing::warn!(file = %stored.name, error = %cleanup, "failed to remove orphaned file");
                }
                return Err(e.into());
            }
        };

        tracing::info!(step_id = %step.id, file = %share.file_name, share_id = %share.share_id, "disk file created");
        Ok(json!({
            "share_id": share.share_id,
            "password": share.password,
            "file_name": share.file_name,
            "file_path": share.file_path,
            "create_time": format_time(&share.create_time),
            "message": "文件生成成功并已添加到网盘",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::DiskFileParams;
    use crate::store::SqliteStore;

    fn step(content: &str, file_name: Option<&str>, password: Option<&str>) -> Step {
        Step {
            id: "step_1".to_string(),
            kind: StepKind::DiskFile(DiskFileParams {
                content: content.to_string(),
                file_name: file_name.map(String::from),
                file_extension: "txt".to_string(),
                password: password.map(String::from),
            }),
        }
    }

    fn executor(store: Arc<SqliteStore>, dir: &tempfile::TempDir) -> DiskFileExecutor {
        let files = Arc::new(LocalFileStorage::new(dir.path(), "/static/files/online_disk"));
        DiskFileExecutor::new(store, files, &DiskSection::default())
    }

    #[tokio::test]
    async fn test_creates_file_and_share() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let exec = executor(store.clone(), &dir);

        let out = exec
            .execute(&step("脚本技巧合集", Some("tips"), None), &ResourcePool::new())
            .await
            .unwrap();

        assert_eq!(out["file_name"], "tips.txt");
        assert_eq!(out["file_path"], "/static/files/online_disk/tips.txt");
        let share_id = out["share_id"].as_str().unwrap();
        assert_eq!(share_id.len(), 8);
        assert!(share_id.chars().all(|c| c.is_ascii_alphanumeric()));
        let password = out["password"].as_str().unwrap();
        assert_eq!(password.len(), 6);
        assert!(password.chars().all(|c| c.is_ascii_digit()));
        assert!(store.share_exists(share_id).unwrap());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("tips.txt")).unwrap(),
            "脚本技巧合集"
        );
    }

    #[tokio::test]
    async fn test_explicit_password_and_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let exec = executor(store, &dir);

        let out = exec
            .execute(&step("内容", None, Some("abc123")), &ResourcePool::new())
            .await
            .unwrap();
        assert_eq!(out["password"], "abc123");
        let name = out["file_name"].as_str().unwrap();
        assert!(name.starts_with("ai-generated-") && name.ends_with(".txt"));
    }

    #[tokio::test]
    async fn test_empty_content_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let exec = executor(store, &dir);

        let err = exec
            .execute(&step("   ", Some("x"), None), &ResourcePool::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidParams(_)));
        assert!(!dir.path().join("x.txt").exists());
    }

    #[tokio::test]
    async fn test_failed_share_insert_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .execute_batch(
                "CREATE TRIGGER reject_share BEFORE INSERT ON disk_shares \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        let exec = executor(store, &dir);

        let err = exec
            .execute(&step("内容", Some("orphan"), None), &ResourcePool::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Persistence(_)));
        assert!(!dir.path().join("orphan.txt").exists());
    }

    #[tokio::test]
    async fn test_same_name_keeps_earlier_share_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let exec = executor(store.clone(), &dir);

        let first = exec
            .execute(&step("第一份", Some("tips"), None), &ResourcePool::new())
            .await
            .unwrap();
        assert_eq!(first["file_name"], "tips.txt");

        let second = exec
            .execute(&step("第二份", Some("tips"), None), &ResourcePool::new())
            .await
            .unwrap();
        let second_share = second["share_id"].as_str().unwrap();
        assert_eq!(second["file_name"], format!("tips-{second_share}.txt"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("tips.txt")).unwrap(),
            "第一份"
        );

        store
            .execute_batch(
                "CREATE TRIGGER reject_share BEFORE INSERT ON disk_shares \
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        let err = exec
            .execute(&step("第三份", Some("tips"), None), &ResourcePool::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Persistence(_)));

        // 失败的步骤不能删掉已登记分享指向的文件
        assert!(store.share_exists(first["share_id"].as_str().unwrap()).unwrap());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("tips.txt")).unwrap(),
            "第一份"
        );
        let remaining = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 2);
    }

    #[tokio::test]
    async fn test_path_traversal_name_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let exec = executor(store, &dir);

        let err = exec
            .execute(&step("内容", Some("../escape"), None), &ResourcePool::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::Storage(_)));
    }
}
