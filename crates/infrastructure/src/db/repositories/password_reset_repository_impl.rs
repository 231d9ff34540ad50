//! 密码重置Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    PasswordReset, PasswordResetKey, PasswordResetRepository, PasswordResetUpsert,
    RepositoryResult, UserId,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::PgSession;

#[derive(Debug, FromRow)]
struct PasswordResetRecord {
    user_id: i64,
    email_count: i32,
    reset_key: Uuid,
    key_expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PasswordResetRecord> for PasswordReset {
    fn from(value: PasswordResetRecord) -> Self {
        PasswordReset {
            user_id: UserId(value.user_id),
            email_count: value.email_count,
            reset_key: PasswordResetKey::from(value.reset_key),
            key_expires_at: value.key_expires_at,
            updated_at: value.updated_at,
        }
    }
}

pub struct PgPasswordResetRepository {
    session: PgSession,
}

impl PgPasswordResetRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl PasswordResetRepository for PgPasswordResetRepository {
    async fn find_by_user(&self, user_id: UserId) -> RepositoryResult<Option<PasswordReset>> {
        let record = self
            .session
            .fetch_optional(
                sqlx::query_as::<_, PasswordResetRecord>(
                    "SELECT user_id, email_count, reset_key, key_expires_at, updated_at \
                     FROM password_resets WHERE user_id = $1",
                )
                .bind(user_id.0),
            )
            .await?;
        Ok(record.map(PasswordReset::from))
    }

    async fn upsert(&self, reset: &PasswordResetUpsert) -> RepositoryResult<Option<i32>> {
        let count = self
            .session
            .fetch_optional(
                sqlx::query_as::<_, (i32,)>(
                    "INSERT INTO password_resets \
                         (user_id, email_count, reset_key, key_expires_at, updated_at) \
                     VALUES ($1, 1, $2, $3, $4) \
                     ON CONFLICT (user_id) DO UPDATE SET \
                         email_count = CASE \
                             WHEN (password_resets.updated_at AT TIME ZONE 'UTC')::date \
                                 < ($4 AT TIME ZONE 'UTC')::date THEN 1 \
                             ELSE password_resets.email_count + 1 \
                         END, \
                         reset_key = EXCLUDED.reset_key, \
                         key_expires_at = EXCLUDED.key_expires_at, \
                         updated_at = EXCLUDED.updated_at \
                     WHERE (password_resets.updated_at AT TIME ZONE 'UTC')::date \
                             < ($4 AT TIME ZONE 'UTC')::date \
                         OR password_resets.email_count < $5 \
                     RETURNING email_count",
                )
                .bind(reset.user_id.0)
                .bind(reset.reset_key.as_uuid())
                .bind(reset.key_expires_at)
                .bind(reset.updated_at)
                .bind(reset.daily_limit),
            )
            .await?;
        Ok(count.map(|(count,)| count))
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM password_resets WHERE user_id = $1").bind(user_id.0))
            .await
    }
}
