use crate::value_objects::{PostingId, ReportDetail, ReportId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserReport {
    pub id: ReportId,
    pub user_id: UserId,
    pub detail: ReportDetail,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewUserReport {
    pub user_id: UserId,
    pub detail: ReportDetail,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingReport {
    pub id: ReportId,
    pub posting_id: PostingId,
    pub detail: ReportDetail,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewPostingReport {
    pub posting_id: PostingId,
    pub detail: ReportDetail,
    pub created_at: Timestamp,
}
