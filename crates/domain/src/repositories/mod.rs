//! Repository接口定义
//!
//! 每个实体一个仓储。实现方既可以直接作用于连接池，也可以绑定在某个事务上，
//! 接口本身不区分两者。

pub mod comment_repository;
pub mod follow_repository;
pub mod like_repository;
pub mod notification_repository;
pub mod password_reset_repository;
pub mod posting_repository;
pub mod report_repository;
pub mod user_repository;

use crate::errors::RepositoryError;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub use comment_repository::CommentRepository;
pub use follow_repository::FollowRepository;
pub use like_repository::LikeRepository;
pub use notification_repository::NotificationRepository;
pub use password_reset_repository::PasswordResetRepository;
pub use posting_repository::PostingRepository;
pub use report_repository::ReportRepository;
pub use user_repository::UserRepository;
