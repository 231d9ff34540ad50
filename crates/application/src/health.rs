//! 就绪探测接口。

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{component} unavailable: {reason}")]
pub struct HealthError {
    pub component: &'static str,
    pub reason: String,
}

impl HealthError {
    pub fn new(component: &'static str, reason: impl Into<String>) -> Self {
        Self {
            component,
            reason: reason.into(),
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// 依赖的外部资源（目前只有数据库）都能响应时返回 `Ok`。
    async fn readiness(&self) -> Result<(), HealthError>;
}
