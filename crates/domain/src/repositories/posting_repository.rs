//! 投稿Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::posting::{NewPosting, Posting, PostingQuery};
use crate::value_objects::{PostingId, Timestamp, UserId};

#[async_trait]
pub trait PostingRepository: Send + Sync {
    async fn create(&self, posting: &NewPosting) -> RepositoryResult<Posting>;

    /// 按主键读取，包括已标记删除的投稿
    async fn get_by_id(&self, id: PostingId) -> RepositoryResult<Posting>;

    /// 列表查询，排除已标记删除的投稿
    async fn list(&self, query: &PostingQuery) -> RepositoryResult<Vec<Posting>>;

    async fn list_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<Posting>>;

    async fn adjust_liked_count(&self, id: PostingId, delta: i64) -> RepositoryResult<()>;

    /// 扣减 `liker` 点过赞的投稿的 `liked_count`
    async fn decrement_liked_counts_for_likes_by(&self, liker: UserId) -> RepositoryResult<u64>;

    async fn mark_deleting(&self, id: PostingId, at: Timestamp) -> RepositoryResult<u64>;

    async fn delete(&self, id: PostingId) -> RepositoryResult<u64>;

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64>;
}
