use std::sync::Arc;

use domain::{
    LikeRepository, NewLike, NewNotification, NotificationAction, Posting, PostingId,
    PostingRepository, UserCounter, UserRepository,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    identity::Actor,
    notifier::NotificationPublisher,
    services::load_actor,
    transaction::{run_in_transaction, TransactionManager},
};

pub struct LikeServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub posting_repository: Arc<dyn PostingRepository>,
    pub like_repository: Arc<dyn LikeRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub notifier: Arc<dyn NotificationPublisher>,
    pub clock: Arc<dyn Clock>,
}

pub struct LikeService {
    deps: LikeServiceDependencies,
}

impl LikeService {
    pub fn new(deps: LikeServiceDependencies) -> Self {
        Self { deps }
    }

    async fn visible_posting(&self, posting_id: PostingId) -> Result<Posting, ApplicationError> {
        let posting = self
            .deps
            .posting_repository
            .get_by_id(posting_id)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("posting")))?;
        if posting.deleting_at.is_some() {
            return Err(ApplicationError::NotFound("posting"));
        }
        Ok(posting)
    }

    /// 点赞行与三个计数器（点赞者、作者、投稿）在同一事务内写入。
    pub async fn register(&self, actor: &Actor, posting_id: PostingId) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let liker = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let posting = self.visible_posting(posting_id).await?;
        if posting.is_owned_by(liker.id) {
            return Err(ApplicationError::LikeYourSelf);
        }

        let now = self.deps.clock.now();
        let like = NewLike {
            user_id: liker.id,
            posting_id,
            created_at: now,
        };
        let owner_id = posting.user_id;
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            tx.likes()
                .create(&like)
                .await
                .map_err(ApplicationError::on_duplicate(ApplicationError::AlreadyLiked))?;
            tx.users()
                .adjust_counter(like.user_id, UserCounter::Likes, 1)
                .await?;
            tx.users()
                .adjust_counter(owner_id, UserCounter::Liked, 1)
                .await?;
            tx.postings().adjust_liked_count(posting_id, 1).await?;
            self.deps
                .notifier
                .publish(
                    &*tx,
                    NewNotification {
                        visitor_user_id: like.user_id,
                        visited_user_id: owner_id,
                        action: NotificationAction::Like,
                        created_at: now,
                    },
                )
                .await?;
            Ok::<_, ApplicationError>(())
        })
        .await
    }

    pub async fn delete(&self, actor: &Actor, posting_id: PostingId) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let liker = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let posting = self
            .deps
            .posting_repository
            .get_by_id(posting_id)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("posting")))?;
        self.deps
            .like_repository
            .get(liker.id, posting_id)
            .await
            .map_err(ApplicationError::on_not_found(
                ApplicationError::DeleteNotExistsLike,
            ))?;

        let liker_id = liker.id;
        let owner_id = posting.user_id;
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            let deleted = tx.likes().delete(liker_id, posting_id).await?;
            if deleted == 0 {
                // 并发请求已经删除
                return Err(ApplicationError::DeleteNotExistsLike);
            }
            tx.users()
                .adjust_counter(liker_id, UserCounter::Likes, -1)
                .await?;
            tx.users()
                .adjust_counter(owner_id, UserCounter::Liked, -1)
                .await?;
            tx.postings().adjust_liked_count(posting_id, -1).await?;
            Ok::<_, ApplicationError>(())
        })
        .await
    }
}
