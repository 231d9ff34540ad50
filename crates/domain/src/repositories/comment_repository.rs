//! 评论Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::comment::{Comment, NewComment};
use crate::value_objects::{CommentId, PostingId, UserId};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &NewComment) -> RepositoryResult<Comment>;

    async fn get_by_id(&self, id: CommentId) -> RepositoryResult<Comment>;

    /// 按时间倒序
    async fn list_by_posting(&self, posting_id: PostingId) -> RepositoryResult<Vec<Comment>>;

    async fn delete(&self, id: CommentId) -> RepositoryResult<u64>;

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64>;

    async fn delete_on_postings_of(&self, owner: UserId) -> RepositoryResult<u64>;

    async fn delete_by_posting(&self, posting_id: PostingId) -> RepositoryResult<u64>;
}
