//! 领域模型错误定义
//!
//! `DomainError` 描述输入校验失败，`RepositoryError` 是仓储层对存储错误的统一翻译。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 字段校验失败
    #[error("{field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    /// 图片数据无法解码
    #[error("image decode failure")]
    ImageDecode,
}

impl DomainError {
    pub fn invalid_argument(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

/// 仓储层错误。
///
/// 唯一约束冲突统一翻译为 `Duplicate`，按键查询无结果翻译为 `NotFound`，
/// 其余存储错误保留原始信息。
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("not exists data error")]
    NotFound,
    #[error("duplicate data error")]
    Duplicate,
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }
}
