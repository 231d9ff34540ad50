//! 点赞Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Like, LikeId, LikeRepository, NewLike, PostingId, RepositoryResult, UserId};
use sqlx::FromRow;

use crate::db::PgSession;

#[derive(Debug, FromRow)]
struct LikeRecord {
    id: i64,
    user_id: i64,
    posting_id: i64,
    created_at: DateTime<Utc>,
}

impl From<LikeRecord> for Like {
    fn from(value: LikeRecord) -> Self {
        Like {
            id: LikeId(value.id),
            user_id: UserId(value.user_id),
            posting_id: PostingId(value.posting_id),
            created_at: value.created_at,
        }
    }
}

pub struct PgLikeRepository {
    session: PgSession,
}

impl PgLikeRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl LikeRepository for PgLikeRepository {
    async fn create(&self, like: &NewLike) -> RepositoryResult<Like> {
        let record = self
            .session
            .fetch_one(
                sqlx::query_as::<_, LikeRecord>(
                    "INSERT INTO likes (user_id, posting_id, created_at) VALUES ($1, $2, $3) \
                     RETURNING id, user_id, posting_id, created_at",
                )
                .bind(like.user_id.0)
                .bind(like.posting_id.0)
                .bind(like.created_at),
            )
            .await?;
        Ok(record.into())
    }

    async fn get(&self, user_id: UserId, posting_id: PostingId) -> RepositoryResult<Like> {
        let record = self
            .session
            .fetch_one(
                sqlx::query_as::<_, LikeRecord>(
                    "SELECT id, user_id, posting_id, created_at FROM likes \
                     WHERE user_id = $1 AND posting_id = $2",
                )
                .bind(user_id.0)
                .bind(posting_id.0),
            )
            .await?;
        Ok(record.into())
    }

    async fn liked_posting_ids(
        &self,
        user_id: UserId,
        candidates: &[PostingId],
    ) -> RepositoryResult<Vec<PostingId>> {
        let ids: Vec<i64> = candidates.iter().map(|id| id.0).collect();
        let rows: Vec<(i64,)> = self
            .session
            .fetch_all(
                sqlx::query_as(
                    "SELECT posting_id FROM likes WHERE user_id = $1 AND posting_id = ANY($2)",
                )
                .bind(user_id.0)
                .bind(&ids),
            )
            .await?;
        Ok(rows.into_iter().map(|(id,)| PostingId(id)).collect())
    }

    async fn delete(&self, user_id: UserId, posting_id: PostingId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query("DELETE FROM likes WHERE user_id = $1 AND posting_id = $2")
                    .bind(user_id.0)
                    .bind(posting_id.0),
            )
            .await
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM likes WHERE user_id = $1").bind(user_id.0))
            .await
    }

    async fn delete_on_postings_of(&self, owner: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "DELETE FROM likes l USING postings p \
                     WHERE l.posting_id = p.id AND p.user_id = $1",
                )
                .bind(owner.0),
            )
            .await
    }

    async fn delete_by_posting(&self, posting_id: PostingId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM likes WHERE posting_id = $1").bind(posting_id.0))
            .await
    }
}
