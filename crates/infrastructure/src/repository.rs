//! 绑定在连接池上的仓储集合，用于只读查询与事务外的前置检查。

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::{
    repositories::{
        PgCommentRepository, PgFollowRepository, PgLikeRepository, PgNotificationRepository,
        PgPasswordResetRepository, PgPostingRepository, PgReportRepository, PgUserRepository,
    },
    PgSession,
};

#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub posting_repository: Arc<PgPostingRepository>,
    pub like_repository: Arc<PgLikeRepository>,
    pub comment_repository: Arc<PgCommentRepository>,
    pub follow_repository: Arc<PgFollowRepository>,
    pub notification_repository: Arc<PgNotificationRepository>,
    pub password_reset_repository: Arc<PgPasswordResetRepository>,
    pub report_repository: Arc<PgReportRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        let session = PgSession::Pool(pool.clone());
        Self {
            user_repository: Arc::new(PgUserRepository::new(session.clone())),
            posting_repository: Arc::new(PgPostingRepository::new(session.clone())),
            like_repository: Arc::new(PgLikeRepository::new(session.clone())),
            comment_repository: Arc::new(PgCommentRepository::new(session.clone())),
            follow_repository: Arc::new(PgFollowRepository::new(session.clone())),
            notification_repository: Arc::new(PgNotificationRepository::new(session.clone())),
            password_reset_repository: Arc::new(PgPasswordResetRepository::new(session.clone())),
            report_repository: Arc::new(PgReportRepository::new(session)),
            pool,
        }
    }
}
