//! 网盘文件存储：把文本写到 storage_root 下，返回可对外暴露的相对路径

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::StorageError;

/// 实际落盘的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    /// `<url_prefix>/<name>`
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate(name: &str) -> Result<(), StorageError> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// 以独占方式新建文件，不覆盖已有文件
    ///
    /// 同名文件已存在时改用 `<stem>-<suffix>.<ext>`；仍冲突则返回 `AlreadyExists`。
    pub fn write_new(&self, name: &str, content: &str, suffix: &str) -> Result<StoredFile, StorageError> {
        Self::validate(name)?;
        std::fs::create_dir_all(&self.root)?;

        let name = match self.create_exclusive(name, content) {
            Err(StorageError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                let renamed = with_suffix(name, suffix);
                Self::validate(&renamed)?;
                tracing::debug!(file = %name, renamed = %renamed, "file name taken, writing under new name");
                self.create_exclusive(&renamed, content)?;
                renamed
            }
            other => {
                other?;
                name.to_string()
            }
        };
        tracing::debug!(file = %name, bytes = content.len(), "file written");
        let path = format!("{}/{}", self.url_prefix, name);
        Ok(StoredFile { name, path })
    }

    fn create_exclusive(&self, name: &str, content: &str) -> Result<(), StorageError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.root.join(name))?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    /// 删除已写入的文件（记录写入失败时回滚用）
    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        Self::validate(name)?;
        let path = self.root.join(name);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{suffix}.{ext}"),
        _ => format!("{name}-{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_returns_prefixed_path() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "/static/files/online_disk/");
        let stored = storage.write_new("notes.txt", "hello", "x1").unwrap();
        assert_eq!(stored.name, "notes.txt");
        assert_eq!(stored.path, "/static/files/online_disk/notes.txt");
        assert_eq!(std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(), "hello");

        storage.remove("notes.txt").unwrap();
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_existing_file_is_kept_and_new_one_renamed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "/files");
        storage.write_new("tips.txt", "第一份", "aaaa").unwrap();

        let second = storage.write_new("tips.txt", "第二份", "bbbb").unwrap();
        assert_eq!(second.name, "tips-bbbb.txt");
        assert_eq!(second.path, "/files/tips-bbbb.txt");
        assert_eq!(std::fs::read_to_string(dir.path().join("tips.txt")).unwrap(), "第一份");
        assert_eq!(std::fs::read_to_string(dir.path().join("tips-bbbb.txt")).unwrap(), "第二份");

        let err = storage.write_new("tips.txt", "第三份", "bbbb").unwrap_err();
        assert!(matches!(err, StorageError::Io(ref e) if e.kind() == ErrorKind::AlreadyExists));
    }

    #[test]
    fn test_suffix_without_extension() {
        assert_eq!(with_suffix("README", "ab12"), "README-ab12");
        assert_eq!(with_suffix(".env", "ab12"), ".env-ab12");
        assert_eq!(with_suffix("a.tar.gz", "ab12"), "a.tar-ab12.gz");
    }

    #[test]
    fn test_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "/files");
        assert!(matches!(
            storage.write_new("../escape.txt", "x", "s"),
            Err(StorageError::InvalidName(_))
        ));
        assert!(storage.write_new("a/b.txt", "x", "s").is_err());
    }
}
