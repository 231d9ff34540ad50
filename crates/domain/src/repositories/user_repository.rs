//! 用户Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::user::{NewUser, User, UserCounter};
use crate::value_objects::{
    ActivationKey, PasswordHash, PostingId, SelfIntroduction, Timestamp, UserEmail, UserId,
    UserName,
};

/// 用户Repository接口
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建新用户，用户名或邮箱重复时返回 `Duplicate`
    async fn create(&self, user: &NewUser) -> RepositoryResult<User>;

    async fn get_by_id(&self, id: UserId) -> RepositoryResult<User>;

    async fn get_by_name(&self, name: &UserName) -> RepositoryResult<User>;

    async fn get_by_email(&self, email: &UserEmail) -> RepositoryResult<User>;

    /// 激活尚未验证的账号；名字与密钥不匹配或已激活时返回 `NotFound`
    async fn activate(
        &self,
        name: &UserName,
        key: &ActivationKey,
        now: Timestamp,
    ) -> RepositoryResult<()>;

    async fn update_password(
        &self,
        id: UserId,
        password: &PasswordHash,
        now: Timestamp,
    ) -> RepositoryResult<()>;

    async fn update_icon(&self, id: UserId, icon_url: &str, now: Timestamp)
        -> RepositoryResult<()>;

    async fn update_self_introduction(
        &self,
        id: UserId,
        self_introduction: &SelfIntroduction,
        now: Timestamp,
    ) -> RepositoryResult<()>;

    /// `counter = counter + delta`，在数据库端原子执行
    async fn adjust_counter(
        &self,
        id: UserId,
        counter: UserCounter,
        delta: i64,
    ) -> RepositoryResult<()>;

    /// 扣减 `liker` 点过赞的投稿作者的 `liked_count`
    async fn decrement_liked_counts_for_likes_by(&self, liker: UserId) -> RepositoryResult<u64>;

    /// 扣减给 `owner` 的投稿点过赞的用户的 `like_count`
    async fn decrement_like_counts_for_likes_on_postings_of(
        &self,
        owner: UserId,
    ) -> RepositoryResult<u64>;

    /// 扣减给某条投稿点过赞的用户的 `like_count`
    async fn decrement_like_counts_for_likes_on_posting(
        &self,
        posting_id: PostingId,
    ) -> RepositoryResult<u64>;

    /// 扣减与 `user_id` 存在关注关系的另一方的计数（双向）
    async fn decrement_follow_counts_for(&self, user_id: UserId) -> RepositoryResult<u64>;

    async fn delete(&self, id: UserId) -> RepositoryResult<u64>;
}
