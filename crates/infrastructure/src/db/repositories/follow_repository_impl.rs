//! 关注Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Follow, FollowId, FollowRepository, NewFollow, RepositoryResult, UserId};
use sqlx::FromRow;

use crate::db::PgSession;

#[derive(Debug, FromRow)]
struct FollowRecord {
    id: i64,
    following_user_id: i64,
    followed_user_id: i64,
    created_at: DateTime<Utc>,
}

impl From<FollowRecord> for Follow {
    fn from(value: FollowRecord) -> Self {
        Follow {
            id: FollowId(value.id),
            following_user_id: UserId(value.following_user_id),
            followed_user_id: UserId(value.followed_user_id),
            created_at: value.created_at,
        }
    }
}

pub struct PgFollowRepository {
    session: PgSession,
}

impl PgFollowRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    async fn create(&self, follow: &NewFollow) -> RepositoryResult<Follow> {
        let record = self
            .session
            .fetch_one(
                sqlx::query_as::<_, FollowRecord>(
                    "INSERT INTO follows (following_user_id, followed_user_id, created_at) \
                     VALUES ($1, $2, $3) \
                     RETURNING id, following_user_id, followed_user_id, created_at",
                )
                .bind(follow.following_user_id.0)
                .bind(follow.followed_user_id.0)
                .bind(follow.created_at),
            )
            .await?;
        Ok(record.into())
    }

    async fn get(&self, following: UserId, followed: UserId) -> RepositoryResult<Follow> {
        let record = self
            .session
            .fetch_one(
                sqlx::query_as::<_, FollowRecord>(
                    "SELECT id, following_user_id, followed_user_id, created_at FROM follows \
                     WHERE following_user_id = $1 AND followed_user_id = $2",
                )
                .bind(following.0)
                .bind(followed.0),
            )
            .await?;
        Ok(record.into())
    }

    async fn delete(&self, following: UserId, followed: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "DELETE FROM follows WHERE following_user_id = $1 AND followed_user_id = $2",
                )
                .bind(following.0)
                .bind(followed.0),
            )
            .await
    }

    /// 同时删除该用户关注别人与被别人关注的记录
    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "DELETE FROM follows WHERE following_user_id = $1 OR followed_user_id = $1",
                )
                .bind(user_id.0),
            )
            .await
    }
}
