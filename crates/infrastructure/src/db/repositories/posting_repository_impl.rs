//! 投稿Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    NewPosting, Posting, PostingId, PostingQuery, PostingRepository, PostingTitle,
    RepositoryResult, Timestamp, UserId, UserName,
};
use sqlx::FromRow;

use crate::db::{expect_affected, invalid_data, PgSession};

/// 联表取出作者名
const POSTING_SELECT: &str = "SELECT p.id, p.user_id, u.name AS user_name, p.title, \
    p.image_url, p.image_key, p.liked_count, p.deleting_at, p.created_at, p.updated_at \
    FROM postings p JOIN users u ON u.id = p.user_id";

#[derive(Debug, FromRow)]
struct PostingRecord {
    id: i64,
    user_id: i64,
    user_name: String,
    title: String,
    image_url: String,
    image_key: String,
    liked_count: i64,
    deleting_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostingRecord> for Posting {
    type Error = domain::RepositoryError;

    fn try_from(value: PostingRecord) -> Result<Self, Self::Error> {
        Ok(Posting {
            id: PostingId(value.id),
            user_id: UserId(value.user_id),
            user_name: UserName::parse(value.user_name).map_err(invalid_data)?,
            title: PostingTitle::parse(value.title).map_err(invalid_data)?,
            image_url: value.image_url,
            image_key: value.image_key,
            liked_count: value.liked_count,
            deleting_at: value.deleting_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

fn into_postings(records: Vec<PostingRecord>) -> RepositoryResult<Vec<Posting>> {
    records.into_iter().map(Posting::try_from).collect()
}

pub struct PgPostingRepository {
    session: PgSession,
}

impl PgPostingRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl PostingRepository for PgPostingRepository {
    async fn create(&self, posting: &NewPosting) -> RepositoryResult<Posting> {
        let query = sqlx::query_as::<_, PostingRecord>(
            "WITH inserted AS ( \
                 INSERT INTO postings (user_id, title, image_url, image_key, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $5) RETURNING * \
             ) \
             SELECT i.id, i.user_id, u.name AS user_name, i.title, i.image_url, i.image_key, \
                    i.liked_count, i.deleting_at, i.created_at, i.updated_at \
             FROM inserted i JOIN users u ON u.id = i.user_id",
        )
        .bind(posting.user_id.0)
        .bind(posting.title.as_str())
        .bind(&posting.image_url)
        .bind(&posting.image_key)
        .bind(posting.created_at);
        Posting::try_from(self.session.fetch_one(query).await?)
    }

    async fn get_by_id(&self, id: PostingId) -> RepositoryResult<Posting> {
        let sql = format!("{POSTING_SELECT} WHERE p.id = $1");
        let query = sqlx::query_as::<_, PostingRecord>(&sql).bind(id.0);
        Posting::try_from(self.session.fetch_one(query).await?)
    }

    async fn list(&self, query: &PostingQuery) -> RepositoryResult<Vec<Posting>> {
        let sql = format!(
            "{POSTING_SELECT} \
             WHERE p.deleting_at IS NULL AND p.created_at < $1 \
               AND ($2::BIGINT IS NULL OR p.user_id = $2) \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $3"
        );
        let records = self
            .session
            .fetch_all(
                sqlx::query_as::<_, PostingRecord>(&sql)
                    .bind(query.since)
                    .bind(query.user_id.map(|id| id.0))
                    .bind(i64::from(query.limit)),
            )
            .await?;
        into_postings(records)
    }

    async fn list_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<Posting>> {
        let sql = format!("{POSTING_SELECT} WHERE p.user_id = $1 ORDER BY p.id");
        let records = self
            .session
            .fetch_all(sqlx::query_as::<_, PostingRecord>(&sql).bind(user_id.0))
            .await?;
        into_postings(records)
    }

    async fn adjust_liked_count(&self, id: PostingId, delta: i64) -> RepositoryResult<()> {
        let rows = self
            .session
            .execute(
                sqlx::query("UPDATE postings SET liked_count = liked_count + $2 WHERE id = $1")
                    .bind(id.0)
                    .bind(delta),
            )
            .await?;
        expect_affected(rows)
    }

    async fn decrement_liked_counts_for_likes_by(&self, liker: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "UPDATE postings p SET liked_count = p.liked_count - 1 \
                     FROM likes l WHERE l.posting_id = p.id AND l.user_id = $1",
                )
                .bind(liker.0),
            )
            .await
    }

    async fn mark_deleting(&self, id: PostingId, at: Timestamp) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "UPDATE postings SET deleting_at = $2 WHERE id = $1 AND deleting_at IS NULL",
                )
                .bind(id.0)
                .bind(at),
            )
            .await
    }

    async fn delete(&self, id: PostingId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM postings WHERE id = $1").bind(id.0))
            .await
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM postings WHERE user_id = $1").bind(user_id.0))
            .await
    }
}
