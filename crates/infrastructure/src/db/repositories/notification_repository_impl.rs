//! 通知Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    NewNotification, Notification, NotificationAction, NotificationId, NotificationRepository,
    RepositoryResult, UserId, UserName,
};
use sqlx::FromRow;

use crate::db::{invalid_data, PgSession};

#[derive(Debug, FromRow)]
struct NotificationRecord {
    id: i64,
    visitor_user_id: i64,
    visitor_name: String,
    visited_user_id: i64,
    action: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRecord> for Notification {
    type Error = domain::RepositoryError;

    fn try_from(value: NotificationRecord) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: NotificationId(value.id),
            visitor_user_id: UserId(value.visitor_user_id),
            visitor_name: UserName::parse(value.visitor_name).map_err(invalid_data)?,
            visited_user_id: UserId(value.visited_user_id),
            action: value
                .action
                .parse::<NotificationAction>()
                .map_err(invalid_data)?,
            created_at: value.created_at,
        })
    }
}

pub struct PgNotificationRepository {
    session: PgSession,
}

impl PgNotificationRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: &NewNotification) -> RepositoryResult<()> {
        self.session
            .execute(
                sqlx::query(
                    "INSERT INTO notifications (visitor_user_id, visited_user_id, action, created_at) \
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(notification.visitor_user_id.0)
                .bind(notification.visited_user_id.0)
                .bind(notification.action.as_str())
                .bind(notification.created_at),
            )
            .await?;
        Ok(())
    }

    async fn list_for_user(&self, visited: UserId) -> RepositoryResult<Vec<Notification>> {
        self.session
            .fetch_all(
                sqlx::query_as::<_, NotificationRecord>(
                    "SELECT n.id, n.visitor_user_id, u.name AS visitor_name, n.visited_user_id, \
                            n.action, n.created_at \
                     FROM notifications n JOIN users u ON u.id = n.visitor_user_id \
                     WHERE n.visited_user_id = $1 \
                     ORDER BY n.created_at DESC, n.id DESC",
                )
                .bind(visited.0),
            )
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn delete_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "DELETE FROM notifications WHERE visitor_user_id = $1 OR visited_user_id = $1",
                )
                .bind(user_id.0),
            )
            .await
    }
}
