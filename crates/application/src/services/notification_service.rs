use std::sync::Arc;

use domain::{NotificationRepository, UserRepository};

use crate::{
    dto::NotificationView, error::ApplicationError, identity::Actor, services::load_actor,
};

pub struct NotificationServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub notification_repository: Arc<dyn NotificationRepository>,
}

pub struct NotificationService {
    deps: NotificationServiceDependencies,
}

impl NotificationService {
    pub fn new(deps: NotificationServiceDependencies) -> Self {
        Self { deps }
    }

    /// 调用者收到的通知，最新的在前。
    pub async fn list(&self, actor: &Actor) -> Result<Vec<NotificationView>, ApplicationError> {
        let user = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let notifications = self
            .deps
            .notification_repository
            .list_for_user(user.id)
            .await?;
        Ok(notifications.into_iter().map(NotificationView::from).collect())
    }
}
