//! 举报Repository实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    NewPostingReport, NewUserReport, PostingId, PostingReport, ReportDetail, ReportId,
    ReportRepository, RepositoryResult, UserId, UserReport,
};
use sqlx::FromRow;

use crate::db::{invalid_data, PgSession};

#[derive(Debug, FromRow)]
struct ReportRecord {
    id: i64,
    target_id: i64,
    detail: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReportRecord> for UserReport {
    type Error = domain::RepositoryError;

    fn try_from(value: ReportRecord) -> Result<Self, Self::Error> {
        Ok(UserReport {
            id: ReportId(value.id),
            user_id: UserId(value.target_id),
            detail: ReportDetail::parse(value.detail).map_err(invalid_data)?,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<ReportRecord> for PostingReport {
    type Error = domain::RepositoryError;

    fn try_from(value: ReportRecord) -> Result<Self, Self::Error> {
        Ok(PostingReport {
            id: ReportId(value.id),
            posting_id: PostingId(value.target_id),
            detail: ReportDetail::parse(value.detail).map_err(invalid_data)?,
            created_at: value.created_at,
        })
    }
}

pub struct PgReportRepository {
    session: PgSession,
}

impl PgReportRepository {
    pub fn new(session: PgSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl ReportRepository for PgReportRepository {
    async fn create_user_report(&self, report: &NewUserReport) -> RepositoryResult<UserReport> {
        let record = self
            .session
            .fetch_one(
                sqlx::query_as::<_, ReportRecord>(
                    "INSERT INTO user_reports (user_id, detail, created_at) VALUES ($1, $2, $3) \
                     RETURNING id, user_id AS target_id, detail, created_at",
                )
                .bind(report.user_id.0)
                .bind(report.detail.as_str())
                .bind(report.created_at),
            )
            .await?;
        UserReport::try_from(record)
    }

    async fn create_posting_report(
        &self,
        report: &NewPostingReport,
    ) -> RepositoryResult<PostingReport> {
        let record = self
            .session
            .fetch_one(
                sqlx::query_as::<_, ReportRecord>(
                    "INSERT INTO posting_reports (posting_id, detail, created_at) \
                     VALUES ($1, $2, $3) \
                     RETURNING id, posting_id AS target_id, detail, created_at",
                )
                .bind(report.posting_id.0)
                .bind(report.detail.as_str())
                .bind(report.created_at),
            )
            .await?;
        PostingReport::try_from(record)
    }

    async fn delete_user_reports(&self, user_id: UserId) -> RepositoryResult<u64> {
        self.session
            .execute(sqlx::query("DELETE FROM user_reports WHERE user_id = $1").bind(user_id.0))
            .await
    }

    async fn delete_posting_reports(&self, posting_id: PostingId) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query("DELETE FROM posting_reports WHERE posting_id = $1")
                    .bind(posting_id.0),
            )
            .await
    }

    async fn delete_posting_reports_on_postings_of(
        &self,
        owner: UserId,
    ) -> RepositoryResult<u64> {
        self.session
            .execute(
                sqlx::query(
                    "DELETE FROM posting_reports r USING postings p \
                     WHERE r.posting_id = p.id AND p.user_id = $1",
                )
                .bind(owner.0),
            )
            .await
    }
}
