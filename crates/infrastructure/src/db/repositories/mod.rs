//! PostgreSQL 仓储实现

pub mod comment_repository_impl;
pub mod follow_repository_impl;
pub mod like_repository_impl;
pub mod notification_repository_impl;
pub mod password_reset_repository_impl;
pub mod posting_repository_impl;
pub mod report_repository_impl;
pub mod user_repository_impl;

pub use comment_repository_impl::PgCommentRepository;
pub use follow_repository_impl::PgFollowRepository;
pub use like_repository_impl::PgLikeRepository;
pub use notification_repository_impl::PgNotificationRepository;
pub use password_reset_repository_impl::PgPasswordResetRepository;
pub use posting_repository_impl::PgPostingRepository;
pub use report_repository_impl::PgReportRepository;
pub use user_repository_impl::PgUserRepository;
