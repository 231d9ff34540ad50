use std::collections::HashSet;
use std::sync::Arc;

use domain::{
    DomainError, ImageData, LikeRepository, NewPosting, Posting, PostingId, PostingQuery,
    PostingRepository, PostingTitle, Timestamp, UserCounter, UserName, UserRepository,
};

use crate::{
    clock::Clock,
    dto::PostingView,
    error::ApplicationError,
    identity::Actor,
    services::load_actor,
    storage::{ObjectStorage, StorageBuckets},
    transaction::{run_in_transaction, TransactionManager},
};

pub const DEFAULT_POSTINGS_LIMIT: u32 = 20;
pub const MAX_POSTINGS_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct RegisterPostingRequest {
    pub title: String,
    /// base64 编码的图片
    pub image: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListPostingsRequest {
    pub since_at: Option<Timestamp>,
    pub limit: Option<u32>,
    pub user_name: Option<String>,
}

pub struct PostingServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub posting_repository: Arc<dyn PostingRepository>,
    pub like_repository: Arc<dyn LikeRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub storage: Arc<dyn ObjectStorage>,
    pub clock: Arc<dyn Clock>,
    pub buckets: StorageBuckets,
}

pub struct PostingService {
    deps: PostingServiceDependencies,
}

fn image_key(now: Timestamp, owner: &UserName, image: &ImageData) -> String {
    let extension = match image.format() {
        domain::ImageFormat::Png => "png",
        domain::ImageFormat::Jpeg => "jpg",
        domain::ImageFormat::Gif => "gif",
    };
    let nanos = now
        .timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros() * 1_000);
    format!("{nanos}_{owner}.{extension}")
}

impl PostingService {
    pub fn new(deps: PostingServiceDependencies) -> Self {
        Self { deps }
    }

    /// 先上传图片，再在事务内写入投稿并累加作者的投稿数。
    pub async fn register(
        &self,
        actor: &Actor,
        request: RegisterPostingRequest,
    ) -> Result<Posting, ApplicationError> {
        actor.ensure_member()?;
        let user = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let title = PostingTitle::parse(request.title)?;
        let image = ImageData::decode_base64(&request.image)?;

        let now = self.deps.clock.now();
        let key = image_key(now, &user.name, &image);
        let stored = self
            .deps
            .storage
            .put(
                &self.deps.buckets.postings,
                &key,
                image.content_type(),
                image.into_bytes(),
            )
            .await?;

        let new_posting = NewPosting {
            user_id: user.id,
            title,
            image_url: stored.url,
            image_key: stored.key.clone(),
            created_at: now,
        };
        let result = run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            let posting = tx.postings().create(&new_posting).await?;
            tx.users()
                .adjust_counter(new_posting.user_id, UserCounter::Postings, 1)
                .await?;
            Ok::<_, ApplicationError>(posting)
        })
        .await;

        if result.is_err() {
            // 投稿没有落库，已上传的图片不再被引用
            if let Err(err) = self
                .deps
                .storage
                .delete(&self.deps.buckets.postings, &stored.key)
                .await
            {
                tracing::error!(error = %err, key = %stored.key, "清理未使用的图片失败");
            }
        }
        result
    }

    pub async fn list(
        &self,
        actor: &Actor,
        request: ListPostingsRequest,
    ) -> Result<Vec<PostingView>, ApplicationError> {
        let viewer = load_actor(self.deps.user_repository.as_ref(), actor).await?;

        let limit = request.limit.unwrap_or(DEFAULT_POSTINGS_LIMIT);
        if limit == 0 || limit > MAX_POSTINGS_LIMIT {
            return Err(DomainError::invalid_argument(
                "limit",
                format!("must be between 1 and {MAX_POSTINGS_LIMIT}"),
            )
            .into());
        }

        let user_id = match request.user_name {
            Some(name) => {
                let name = UserName::parse(name)?;
                let owner = self
                    .deps
                    .user_repository
                    .get_by_name(&name)
                    .await
                    .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("user")))?;
                Some(owner.id)
            }
            None => None,
        };

        let query = PostingQuery {
            since: request.since_at.unwrap_or_else(|| self.deps.clock.now()),
            limit,
            user_id,
        };
        let postings = self.deps.posting_repository.list(&query).await?;

        let ids: Vec<PostingId> = postings.iter().map(|posting| posting.id).collect();
        let liked: HashSet<PostingId> = if ids.is_empty() {
            HashSet::new()
        } else {
            self.deps
                .like_repository
                .liked_posting_ids(viewer.id, &ids)
                .await?
                .into_iter()
                .collect()
        };

        Ok(postings
            .into_iter()
            .map(|posting| PostingView {
                posting_id: posting.id.0,
                user_name: posting.user_name.to_string(),
                uploaded_at: posting.created_at,
                title: posting.title.as_str().to_owned(),
                image_url: posting.image_url,
                liked_count: posting.liked_count,
                liked: liked.contains(&posting.id),
            })
            .collect())
    }

    /// 两阶段删除：标记投稿、删除图片对象、再在事务内删除投稿及其关联数据。
    /// 图片删除失败时投稿保持标记状态（列表不可见），可再次调用重试。
    pub async fn delete(&self, actor: &Actor, posting_id: PostingId) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let user = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let posting = self
            .deps
            .posting_repository
            .get_by_id(posting_id)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("posting")))?;
        if !posting.is_owned_by(user.id) {
            return Err(ApplicationError::Forbidden(
                "the posting does not belong to you",
            ));
        }

        if posting.deleting_at.is_none() {
            self.deps
                .posting_repository
                .mark_deleting(posting.id, self.deps.clock.now())
                .await?;
        }

        self.deps
            .storage
            .delete(&self.deps.buckets.postings, &posting.image_key)
            .await?;

        let owner_id = posting.user_id;
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            let current = tx
                .postings()
                .get_by_id(posting_id)
                .await
                .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("posting")))?;

            tx.users()
                .decrement_like_counts_for_likes_on_posting(posting_id)
                .await?;
            tx.users()
                .adjust_counter(owner_id, UserCounter::Liked, -current.liked_count)
                .await?;
            tx.users()
                .adjust_counter(owner_id, UserCounter::Postings, -1)
                .await?;

            tx.likes().delete_by_posting(posting_id).await?;
            tx.comments().delete_by_posting(posting_id).await?;
            tx.reports().delete_posting_reports(posting_id).await?;
            tx.postings().delete(posting_id).await?;
            Ok::<_, ApplicationError>(())
        })
        .await
    }
}
