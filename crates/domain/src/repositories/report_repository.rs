//! 举报Repository接口定义

use async_trait::async_trait;

use super::RepositoryResult;
use crate::entities::report::{NewPostingReport, NewUserReport, PostingReport, UserReport};
use crate::value_objects::{PostingId, UserId};

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create_user_report(&self, report: &NewUserReport) -> RepositoryResult<UserReport>;

    async fn create_posting_report(
        &self,
        report: &NewPostingReport,
    ) -> RepositoryResult<PostingReport>;

    async fn delete_user_reports(&self, user_id: UserId) -> RepositoryResult<u64>;

    async fn delete_posting_reports(&self, posting_id: PostingId) -> RepositoryResult<u64>;

    async fn delete_posting_reports_on_postings_of(&self, owner: UserId)
        -> RepositoryResult<u64>;
}
