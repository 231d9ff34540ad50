//! 点赞Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::like::{Like, NewLike};
use crate::value_objects::{PostingId, UserId};

#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// 同一用户对同一投稿重复点赞时返回 `Duplicate`
    async fn create(&self, like: &NewLike) -> RepositoryResult<Like>;

    async fn get(&self, user_id: UserId, posting_id: PostingId) -> RepositoryResult<Like>;

    /// 返回 `candidates` 中被 `user_id` 点过赞的投稿
    async fn liked_posting_ids(
        &self,
        user_id: UserId,
        candidates: &[PostingId],
    ) -> RepositoryResult<Vec<PostingId>>;

    async fn delete(&self, user_id: UserId, posting_id: PostingId) -> RepositoryResult<u64>;

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64>;

    /// 删除别人给 `owner` 的投稿点的赞
    async fn delete_on_postings_of(&self, owner: UserId) -> RepositoryResult<u64>;

    async fn delete_by_posting(&self, posting_id: PostingId) -> RepositoryResult<u64>;
}
