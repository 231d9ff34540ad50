//! 通知Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::notification::{NewNotification, Notification};
use crate::value_objects::UserId;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &NewNotification) -> RepositoryResult<()>;

    /// `visited` 收到的通知，按时间倒序
    async fn list_for_user(&self, visited: UserId) -> RepositoryResult<Vec<Notification>>;

    /// 删除 `user_id` 作为访问者或被访问者的所有通知
    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64>;
}
