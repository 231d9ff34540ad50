//! 关注Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::follow::{Follow, NewFollow};
use crate::value_objects::UserId;

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// 同一有序对重复关注时返回 `Duplicate`
    async fn create(&self, follow: &NewFollow) -> RepositoryResult<Follow>;

    async fn get(&self, following: UserId, followed: UserId) -> RepositoryResult<Follow>;

    async fn delete(&self, following: UserId, followed: UserId) -> RepositoryResult<u64>;

    /// 删除 `user_id` 参与的所有关注关系（双向）
    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64>;
}
