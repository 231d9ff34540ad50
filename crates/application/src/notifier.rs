//! 通知扩展点。
//!
//! 点赞、评论、关注用例在各自的事务内调用 [`NotificationPublisher::publish`]；
//! 是否真正落库由注入的实现决定。

use async_trait::async_trait;
use domain::NewNotification;

use crate::{error::ApplicationError, transaction::UnitOfWork};

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(
        &self,
        tx: &dyn UnitOfWork,
        notification: NewNotification,
    ) -> Result<(), ApplicationError>;
}

/// 写入 `notifications` 表。
#[derive(Debug, Default, Clone, Copy)]
pub struct StoredNotifications;

#[async_trait]
impl NotificationPublisher for StoredNotifications {
    async fn publish(
        &self,
        tx: &dyn UnitOfWork,
        notification: NewNotification,
    ) -> Result<(), ApplicationError> {
        tx.notifications().create(&notification).await?;
        Ok(())
    }
}

/// 丢弃所有通知。
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifications;

#[async_trait]
impl NotificationPublisher for DisabledNotifications {
    async fn publish(
        &self,
        _tx: &dyn UnitOfWork,
        notification: NewNotification,
    ) -> Result<(), ApplicationError> {
        tracing::trace!(action = %notification.action, "通知已关闭，忽略");
        Ok(())
    }
}
