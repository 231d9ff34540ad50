use std::sync::Arc;

use domain::{
    CommentBody, CommentId, CommentRepository, NewComment, NewNotification, NotificationAction,
    PostingId, PostingRepository, UserRepository,
};

use crate::{
    clock::Clock,
    dto::CommentView,
    error::ApplicationError,
    identity::Actor,
    notifier::NotificationPublisher,
    services::load_actor,
    transaction::{run_in_transaction, TransactionManager},
};

#[derive(Debug, Clone)]
pub struct RegisterCommentRequest {
    pub posting_id: PostingId,
    pub comment: String,
}

pub struct CommentServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub posting_repository: Arc<dyn PostingRepository>,
    pub comment_repository: Arc<dyn CommentRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub notifier: Arc<dyn NotificationPublisher>,
    pub clock: Arc<dyn Clock>,
}

pub struct CommentService {
    deps: CommentServiceDependencies,
}

impl CommentService {
    pub fn new(deps: CommentServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(
        &self,
        actor: &Actor,
        request: RegisterCommentRequest,
    ) -> Result<CommentView, ApplicationError> {
        actor.ensure_member()?;
        let author = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let body = CommentBody::parse(request.comment)?;
        let posting = self
            .deps
            .posting_repository
            .get_by_id(request.posting_id)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("posting")))?;
        if posting.deleting_at.is_some() {
            return Err(ApplicationError::NotFound("posting"));
        }

        let now = self.deps.clock.now();
        let new_comment = NewComment {
            user_id: author.id,
            posting_id: posting.id,
            body,
            created_at: now,
        };
        let owner_id = posting.user_id;
        let comment = run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            let comment = tx.comments().create(&new_comment).await?;
            if owner_id != new_comment.user_id {
                self.deps
                    .notifier
                    .publish(
                        &*tx,
                        NewNotification {
                            visitor_user_id: new_comment.user_id,
                            visited_user_id: owner_id,
                            action: NotificationAction::Comment,
                            created_at: now,
                        },
                    )
                    .await?;
            }
            Ok::<_, ApplicationError>(comment)
        })
        .await?;

        Ok(CommentView::from(comment))
    }

    pub async fn list(
        &self,
        actor: &Actor,
        posting_id: PostingId,
    ) -> Result<Vec<CommentView>, ApplicationError> {
        load_actor(self.deps.user_repository.as_ref(), actor).await?;
        self.deps
            .posting_repository
            .get_by_id(posting_id)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("posting")))?;
        let comments = self.deps.comment_repository.list_by_posting(posting_id).await?;
        Ok(comments.into_iter().map(CommentView::from).collect())
    }

    pub async fn delete(&self, actor: &Actor, comment_id: CommentId) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let user = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let comment = self
            .deps
            .comment_repository
            .get_by_id(comment_id)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("comment")))?;
        if comment.user_id != user.id {
            return Err(ApplicationError::Forbidden(
                "the comment does not belong to you",
            ));
        }
        let deleted = self.deps.comment_repository.delete(comment_id).await?;
        if deleted == 0 {
            return Err(ApplicationError::NotFound("comment"));
        }
        Ok(())
    }
}
