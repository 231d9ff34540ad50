//! 用户Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    ActivationKey, NewUser, PasswordHash, PostingId, RepositoryResult, SelfIntroduction,
    Timestamp, User, UserCounter, UserCounters, UserEmail, UserId, UserName, UserRepository,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::{expect_affected, invalid_data, PgSession};

const USER_COLUMNS: &str = "id, name, email, password_hash, icon, self_introduction, \
    posting_count, like_count, liked_count, follow_count, followed_count, \
    activation_key, email_verified, created_at, updated_at";

/// 数据库用户模型
#[derive(Debug, FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    icon: String,
    self_introduction: String,
    posting_count: i64,
    like_count: i64,
    liked_count: i64,
    follow_count: i64,
    followed_count: i64,
    activation_key: Uuid,
    email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = domain::RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(value.id),
            name: UserName::parse(value.name).map_err(invalid_data)?,
            email: UserEmail::parse(value.email).map_err(invalid_data)?,
            password: PasswordHash::new(value.password_hash).map_err(invalid_data)?,
            icon: value.icon,
            self_introduction: value.self_introduction,
            counters: UserCounters {
                posting_count: value.posting_count,
                like_count: value.like_count,
                liked_count: value.liked_count,
                follow_count: value.follow_count,
                followed_count: value.followed_count,
            },
            activation_key: ActivationKey::from(value.activation_key),
            email_verified: value.email_verified,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

pub struct PgUserRepository {
    session: PgSession,
}

impl PgUserRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }

    async fn fetch_one_by(&self, column: &str, bind: UserKey<'_>) -> RepositoryResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let query = sqlx::query_as::<_, UserRecord>(&sql);
        let query = match bind {
            UserKey::Id(id) => query.bind(id),
            UserKey::Text(text) => query.bind(text),
        };
        User::try_from(self.session.fetch_one(query).await?)
    }
}

enum UserKey<'a> {
    Id(i64),
    Text(&'a str),
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> RepositoryResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, activation_key, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {USER_COLUMNS}"
        );
        let query = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user.name.as_str())
            .bind(user.email.as_str())
            .bind(user.password.as_str())
            .bind(user.activation_key.as_uuid())
            .bind(user.created_at);
        User::try_from(self.session.fetch_one(query).await?)
    }

    async fn get_by_id(&self, id: UserId) -> RepositoryResult<User> {
        self.fetch_one_by("id", UserKey::Id(id.0)).await
    }

    async fn get_by_name(&self, name: &UserName) -> RepositoryResult<User> {
        self.fetch_one_by("name", UserKey::Text(name.as_str())).await
    }

    async fn get_by_email(&self, email: &UserEmail) -> RepositoryResult<User> {
        self.fetch_one_by("email", UserKey::Text(email.as_str())).await
    }

    async fn activate(
        &self,
        name: &UserName,
        key: &ActivationKey,
        now: Timestamp,
    ) -> RepositoryResult<()> {
        let rows = self
            .session
            .execute(
                sqlx::query(
                    "UPDATE users SET email_verified = TRUE, updated_at = $3 \
                     WHERE name = $1 AND activation_key = $2 AND email_verified = FALSE",
                )
                .bind(name.as_str())
                .bind(key.as_uuid())
                .bind(now),
            )
            .await?;
        expect_affected(rows)
    }

    async fn update_password(
        &self,
        id: UserId,
        password: &PasswordHash,
        now: Timestamp,
    ) -> RepositoryResult<()> {
        let rows = self
            .session
            .execute(
                sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
                    .bind(id.0)
                    .bind(password.as_str())
                    .bind(now),
            )
            .await?;
        expect_affected(rows)
    }

    async fn update_icon(&self, id: UserId, icon_url: &str, now: Timestamp) -> RepositoryResult<()> {
        let rows = self
            .session
            .execute(
                sqlx::query("UPDATE users SET icon = $2, updated_at = $3 WHERE id = $1")
                    .bind(id.0)
                    .bind(icon_url)
                    .bind(now),
            )
            .await?;
        expect_affected(rows)
    }

    async fn update_self_introduction(
        &self,
        id: UserId,
        self_introduction: &SelfIntroduction,
        now: Timestamp,
    ) -> RepositoryResult<()> {
        let rows = self
            .session
            .execute(
                sqlx::query(
                    "UPDATE users SET self_introduction = $2, updated_at = $3 WHERE id = $1",
                )
                .bind(id.0)
                .bind(self_introduction.as_str())
                .bind(now),
            )
            .await?;
        expect_affected(rows)
    }

    async fn adjust_counter(
        &self,
        id: UserId,
        counter: UserCounter,
        delta: i64,
    ) -> RepositoryResult<()> {
        // 列名来自固定枚举，不接受外部输入
        let column = counter.column();
        let sql = format!("UPDATE users SET {column} = {column} + $2 WHERE id = $1");
        let rows = self
            .session
            .execute(sqlx::query(&sql).bind(id.0).bind(delta))
            .await?;
        expect_affected(rows)
    }

    async fn decrement_liked_counts_for_likes_by(&self, liker: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "UPDATE users u SET liked_count = u.liked_count - c.cnt \
                     FROM (SELECT p.user_id, COUNT(*) AS cnt FROM likes l \
                           JOIN postings p ON p.id = l.posting_id \
                           WHERE l.user_id = $1 GROUP BY p.user_id) c \
                     WHERE u.id = c.user_id",
                )
                .bind(liker.0),
            )
            .await
    }

    async fn decrement_like_counts_for_likes_on_postings_of(
        &self,
        owner: UserId,
    ) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "UPDATE users u SET like_count = u.like_count - c.cnt \
                     FROM (SELECT l.user_id, COUNT(*) AS cnt FROM likes l \
                           JOIN postings p ON p.id = l.posting_id \
                           WHERE p.user_id = $1 GROUP BY l.user_id) c \
                     WHERE u.id = c.user_id",
                )
                .bind(owner.0),
            )
            .await
    }

    async fn decrement_like_counts_for_likes_on_posting(
        &self,
        posting_id: PostingId,
    ) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "UPDATE users u SET like_count = u.like_count - 1 \
                     FROM likes l WHERE l.user_id = u.id AND l.posting_id = $1",
                )
                .bind(posting_id.0),
            )
            .await
    }

    async fn decrement_follow_counts_for(&self, user_id: UserId) -> RepositoryResult<u64> {
        let followed = self
            .session
            .execute(
                sqlx::query(
                    "UPDATE users u SET followed_count = u.followed_count - 1 \
                     FROM follows f WHERE f.following_user_id = $1 AND f.followed_user_id = u.id",
                )
                .bind(user_id.0),
            )
            .await?;
        let following = self
            .session
            .execute(
                sqlx::query(
                    "UPDATE users u SET follow_count = u.follow_count - 1 \
                     FROM follows f WHERE f.followed_user_id = $1 AND f.following_user_id = u.id",
                )
                .bind(user_id.0),
            )
            .await?;
        Ok(followed + following)
    }

    async fn delete(&self, id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM users WHERE id = $1").bind(id.0))
            .await
    }
}
