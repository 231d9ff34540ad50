//! 图片对象存储接口。

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key: {0}")]
    InvalidKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 已写入的对象。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// 各类媒体对应的 bucket 名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBuckets {
    pub postings: String,
    pub icons: String,
}

impl Default for StorageBuckets {
    fn default() -> Self {
        Self {
            postings: "postings".to_owned(),
            icons: "icons".to_owned(),
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredObject, StorageError>;

    /// 删除不存在的对象不是错误。
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}
