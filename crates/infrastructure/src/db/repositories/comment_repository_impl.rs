//! 评论Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Comment, CommentBody, CommentId, CommentRepository, NewComment, PostingId, RepositoryResult,
    UserId, UserName,
};
use sqlx::FromRow;

use crate::db::{invalid_data, PgSession};

const COMMENT_SELECT: &str = "SELECT c.id, c.user_id, u.name AS user_name, c.posting_id, \
    c.comment, c.created_at FROM comments c JOIN users u ON u.id = c.user_id";

#[derive(Debug, FromRow)]
struct CommentRecord {
    id: i64,
    user_id: i64,
    user_name: String,
    posting_id: i64,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRecord> for Comment {
    type Error = domain::RepositoryError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Comment {
            id: CommentId(value.id),
            user_id: UserId(value.user_id),
            user_name: UserName::parse(value.user_name).map_err(invalid_data)?,
            posting_id: PostingId(value.posting_id),
            body: CommentBody::parse(value.comment).map_err(invalid_data)?,
            created_at: value.created_at,
        })
    }
}

pub struct PgCommentRepository {
    session: PgSession,
}

impl PgCommentRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: &NewComment) -> RepositoryResult<Comment> {
        let query = sqlx::query_as::<_, CommentRecord>(
            "WITH inserted AS ( \
                 INSERT INTO comments (user_id, posting_id, comment, created_at) \
                 VALUES ($1, $2, $3, $4) RETURNING * \
             ) \
             SELECT i.id, i.user_id, u.name AS user_name, i.posting_id, i.comment, i.created_at \
             FROM inserted i JOIN users u ON u.id = i.user_id",
        )
        .bind(comment.user_id.0)
        .bind(comment.posting_id.0)
        .bind(comment.body.as_str())
        .bind(comment.created_at);
        Comment::try_from(self.session.fetch_one(query).await?)
    }

    async fn get_by_id(&self, id: CommentId) -> RepositoryResult<Comment> {
        let sql = format!("{COMMENT_SELECT} WHERE c.id = $1");
        let query = sqlx::query_as::<_, CommentRecord>(&sql).bind(id.0);
        Comment::try_from(self.session.fetch_one(query).await?)
    }

    async fn list_by_posting(&self, posting_id: PostingId) -> RepositoryResult<Vec<Comment>> {
        let sql = format!(
            "{COMMENT_SELECT} WHERE c.posting_id = $1 ORDER BY c.created_at DESC, c.id DESC"
        );
        self.session
            .fetch_all(sqlx::query_as::<_, CommentRecord>(&sql).bind(posting_id.0))
            .await?
            .into_iter()
            .map(Comment::try_from)
            .collect()
    }

    async fn delete(&self, id: CommentId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM comments WHERE id = $1").bind(id.0))
            .await
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM comments WHERE user_id = $1").bind(user_id.0))
            .await
    }

    async fn delete_on_postings_of(&self, owner: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "DELETE FROM comments c USING postings p \
                     WHERE c.posting_id = p.id AND p.user_id = $1",
                )
                .bind(owner.0),
            )
            .await
    }

    async fn delete_by_posting(&self, posting_id: PostingId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query("DELETE FROM comments WHERE posting_id = $1").bind(posting_id.0),
            )
            .await
    }
}
