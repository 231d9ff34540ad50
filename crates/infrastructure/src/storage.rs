//! 本地文件系统对象存储：对象保存在 `{root}/{bucket}/{key}`。

use std::path::{Path, PathBuf};

use application::{ObjectStorage, StorageError, StoredObject};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        check_segment(bucket)?;
        check_segment(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

/// bucket 与 key 都只能是单个路径段
fn check_segment(segment: &str) -> Result<(), StorageError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidKey(segment.to_owned()));
    }
    Ok(())
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = bytes.len();
        tokio::fs::write(&path, bytes).await?;
        debug!(bucket, key, content_type, size, "对象已写入");

        Ok(StoredObject {
            key: key.to_owned(),
            url: format!("{}/{bucket}/{key}", self.public_base_url),
        })
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(bucket, key, "对象已删除");
                Ok(())
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://cdn.test/static/");

        let stored = storage
            .put("postings", "1_alice", "image/png", vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(stored.key, "1_alice");
        assert_eq!(stored.url, "http://cdn.test/static/postings/1_alice");

        let path = dir.path().join("postings").join("1_alice");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![1, 2, 3]);

        storage.delete("postings", "1_alice").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn overwrite_keeps_latest_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://cdn.test");

        storage.put("icons", "alice", "image/png", vec![1]).await.unwrap();
        storage.put("icons", "alice", "image/gif", vec![2, 2]).await.unwrap();

        let bytes = tokio::fs::read(dir.path().join("icons").join("alice"))
            .await
            .unwrap();
        assert_eq!(bytes, vec![2, 2]);
    }

    #[tokio::test]
    async fn deleting_missing_object_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://cdn.test");
        storage.delete("icons", "nobody").await.unwrap();
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path(), "http://cdn.test");

        for key in ["", "..", "../etc", "a/b", "a\\b"] {
            let err = storage
                .put("icons", key, "image/png", vec![0])
                .await
                .unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {key:?}");
        }
    }
}
