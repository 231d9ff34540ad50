//! 密码重置Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::password_reset::{PasswordReset, PasswordResetUpsert};
use crate::value_objects::UserId;

#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn find_by_user(&self, user_id: UserId) -> RepositoryResult<Option<PasswordReset>>;

    /// 写入新密钥并返回当天累计次数；当天已达上限时不写入，返回 `None`。
    async fn upsert(&self, reset: &PasswordResetUpsert) -> RepositoryResult<Option<i32>>;

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64>;
}
