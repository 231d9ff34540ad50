use std::sync::Arc;

use domain::{
    FollowRepository, NewFollow, NewNotification, NotificationAction, User, UserCounter,
    UserName, UserRepository,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    identity::Actor,
    notifier::NotificationPublisher,
    services::load_actor,
    transaction::{run_in_transaction, TransactionManager},
};

pub struct FollowServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub follow_repository: Arc<dyn FollowRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub notifier: Arc<dyn NotificationPublisher>,
    pub clock: Arc<dyn Clock>,
}

pub struct FollowService {
    deps: FollowServiceDependencies,
}

impl FollowService {
    pub fn new(deps: FollowServiceDependencies) -> Self {
        Self { deps }
    }

    /// 解析调用者与目标用户；目标不存在时使用 `missing` 作为错误。
    async fn resolve_pair(
        &self,
        actor: &Actor,
        followed_user_name: &str,
        missing: ApplicationError,
    ) -> Result<(User, User), ApplicationError> {
        let follower = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let name = UserName::parse(followed_user_name)?;
        let followed = self
            .deps
            .user_repository
            .get_by_name(&name)
            .await
            .map_err(ApplicationError::on_not_found(missing))?;
        Ok((follower, followed))
    }

    pub async fn register(
        &self,
        actor: &Actor,
        followed_user_name: &str,
    ) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let (follower, followed) = self
            .resolve_pair(actor, followed_user_name, ApplicationError::UserNotExists)
            .await?;
        if follower.id == followed.id {
            return Err(ApplicationError::FollowYourself);
        }

        let now = self.deps.clock.now();
        let follow = NewFollow {
            following_user_id: follower.id,
            followed_user_id: followed.id,
            created_at: now,
        };
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            tx.follows()
                .create(&follow)
                .await
                .map_err(ApplicationError::on_duplicate(ApplicationError::AlreadyFollowed))?;
            tx.users()
                .adjust_counter(follow.following_user_id, UserCounter::Follows, 1)
                .await?;
            tx.users()
                .adjust_counter(follow.followed_user_id, UserCounter::Followed, 1)
                .await?;
            self.deps
                .notifier
                .publish(
                    &*tx,
                    NewNotification {
                        visitor_user_id: follow.following_user_id,
                        visited_user_id: follow.followed_user_id,
                        action: NotificationAction::Follow,
                        created_at: now,
                    },
                )
                .await?;
            Ok::<_, ApplicationError>(())
        })
        .await
    }

    pub async fn delete(
        &self,
        actor: &Actor,
        followed_user_name: &str,
    ) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let (follower, followed) = self
            .resolve_pair(actor, followed_user_name, ApplicationError::UserNotExists)
            .await?;
        self.deps
            .follow_repository
            .get(follower.id, followed.id)
            .await
            .map_err(ApplicationError::on_not_found(
                ApplicationError::DeleteNotExistsFollow,
            ))?;

        let (follower_id, followed_id) = (follower.id, followed.id);
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            let deleted = tx.follows().delete(follower_id, followed_id).await?;
            if deleted == 0 {
                return Err(ApplicationError::DeleteNotExistsFollow);
            }
            tx.users()
                .adjust_counter(follower_id, UserCounter::Follows, -1)
                .await?;
            tx.users()
                .adjust_counter(followed_id, UserCounter::Followed, -1)
                .await?;
            Ok::<_, ApplicationError>(())
        })
        .await
    }

    /// 调用者是否关注了目标用户。
    pub async fn is_following(
        &self,
        actor: &Actor,
        followed_user_name: &str,
    ) -> Result<bool, ApplicationError> {
        let (follower, followed) = self
            .resolve_pair(actor, followed_user_name, ApplicationError::NotFound("user"))
            .await?;
        match self
            .deps
            .follow_repository
            .get(follower.id, followed.id)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
