//! 用例服务。
//!
//! 每个服务持有自己的 `*Dependencies`，[`Services::new`] 从一份共享的依赖集合
//! 构造全部服务，供启动代码与测试使用。

pub mod auth_service;
pub mod comment_service;
pub mod follow_service;
pub mod like_service;
pub mod notification_service;
pub mod password_reset_service;
pub mod posting_service;
pub mod report_service;
pub mod user_service;

#[cfg(test)]
mod posting_service_tests;
#[cfg(test)]
mod user_service_tests;

use std::sync::Arc;

use chrono::Duration;
use domain::{
    CommentRepository, FollowRepository, LikeRepository, NotificationRepository,
    PasswordResetRepository, PostingRepository, ReportRepository, User, UserRepository,
};

pub use auth_service::{AuthService, AuthServiceDependencies, LoginRequest};
pub use comment_service::{CommentService, CommentServiceDependencies, RegisterCommentRequest};
pub use follow_service::{FollowService, FollowServiceDependencies};
pub use like_service::{LikeService, LikeServiceDependencies};
pub use notification_service::{NotificationService, NotificationServiceDependencies};
pub use password_reset_service::{
    PasswordResetEmailRequest, PasswordResetRequest, PasswordResetService,
    PasswordResetServiceDependencies,
};
pub use posting_service::{
    ListPostingsRequest, PostingService, PostingServiceDependencies, RegisterPostingRequest,
};
pub use report_service::{ReportService, ReportServiceDependencies};
pub use user_service::{
    ActivateUserRequest, ChangePasswordRequest, RegisterUserRequest, UpdateUserRequest,
    UserService, UserServiceDependencies,
};

use crate::{
    clock::Clock, error::ApplicationError, identity::Actor, mail::MailLinks, mail::Mailer,
    notifier::NotificationPublisher, password::PasswordHasher, storage::ObjectStorage,
    storage::StorageBuckets, token::TokenService, transaction::TransactionManager,
};

/// 来自配置的业务参数。
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub buckets: StorageBuckets,
    pub mail_links: MailLinks,
    /// 开启后访客账号登录时跳过密码比对
    pub guest_passwordless_login: bool,
    pub password_reset_daily_limit: i32,
    pub password_reset_key_ttl: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            buckets: StorageBuckets::default(),
            mail_links: MailLinks::default(),
            guest_passwordless_login: false,
            password_reset_daily_limit: 3,
            password_reset_key_ttl: Duration::hours(24),
        }
    }
}

pub struct ServiceDependencies {
    pub users: Arc<dyn UserRepository>,
    pub postings: Arc<dyn PostingRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub password_resets: Arc<dyn PasswordResetRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_service: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
    pub storage: Arc<dyn ObjectStorage>,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn NotificationPublisher>,
    pub settings: ServiceSettings,
}

#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub password_resets: Arc<PasswordResetService>,
    pub postings: Arc<PostingService>,
    pub likes: Arc<LikeService>,
    pub comments: Arc<CommentService>,
    pub follows: Arc<FollowService>,
    pub notifications: Arc<NotificationService>,
    pub reports: Arc<ReportService>,
}

impl Services {
    pub fn new(deps: ServiceDependencies) -> Self {
        let settings = deps.settings;

        let auth = AuthService::new(AuthServiceDependencies {
            user_repository: deps.users.clone(),
            password_hasher: deps.password_hasher.clone(),
            token_service: deps.token_service.clone(),
            guest_passwordless_login: settings.guest_passwordless_login,
        });
        let users = UserService::new(UserServiceDependencies {
            user_repository: deps.users.clone(),
            posting_repository: deps.postings.clone(),
            transactions: deps.transactions.clone(),
            password_hasher: deps.password_hasher.clone(),
            clock: deps.clock.clone(),
            mailer: deps.mailer.clone(),
            storage: deps.storage.clone(),
            buckets: settings.buckets.clone(),
            mail_links: settings.mail_links.clone(),
        });
        let password_resets = PasswordResetService::new(PasswordResetServiceDependencies {
            user_repository: deps.users.clone(),
            password_reset_repository: deps.password_resets.clone(),
            transactions: deps.transactions.clone(),
            password_hasher: deps.password_hasher.clone(),
            clock: deps.clock.clone(),
            mailer: deps.mailer.clone(),
            mail_links: settings.mail_links.clone(),
            daily_limit: settings.password_reset_daily_limit,
            key_ttl: settings.password_reset_key_ttl,
        });
        let postings = PostingService::new(PostingServiceDependencies {
            user_repository: deps.users.clone(),
            posting_repository: deps.postings.clone(),
            like_repository: deps.likes.clone(),
            transactions: deps.transactions.clone(),
            storage: deps.storage.clone(),
            clock: deps.clock.clone(),
            buckets: settings.buckets.clone(),
        });
        let likes = LikeService::new(LikeServiceDependencies {
            user_repository: deps.users.clone(),
            posting_repository: deps.postings.clone(),
            like_repository: deps.likes.clone(),
            transactions: deps.transactions.clone(),
            notifier: deps.notifier.clone(),
            clock: deps.clock.clone(),
        });
        let comments = CommentService::new(CommentServiceDependencies {
            user_repository: deps.users.clone(),
            posting_repository: deps.postings.clone(),
            comment_repository: deps.comments.clone(),
            transactions: deps.transactions.clone(),
            notifier: deps.notifier.clone(),
            clock: deps.clock.clone(),
        });
        let follows = FollowService::new(FollowServiceDependencies {
            user_repository: deps.users.clone(),
            follow_repository: deps.follows.clone(),
            transactions: deps.transactions.clone(),
            notifier: deps.notifier.clone(),
            clock: deps.clock.clone(),
        });
        let notifications = NotificationService::new(NotificationServiceDependencies {
            user_repository: deps.users.clone(),
            notification_repository: deps.notifications.clone(),
        });
        let reports = ReportService::new(ReportServiceDependencies {
            user_repository: deps.users,
            posting_repository: deps.postings,
            report_repository: deps.reports,
            clock: deps.clock,
        });

        Self {
            auth: Arc::new(auth),
            users: Arc::new(users),
            password_resets: Arc::new(password_resets),
            postings: Arc::new(postings),
            likes: Arc::new(likes),
            comments: Arc::new(comments),
            follows: Arc::new(follows),
            notifications: Arc::new(notifications),
            reports: Arc::new(reports),
        }
    }
}

/// 读取令牌对应的用户；用户已不存在时返回 `TokenUserNotFound`。
pub(crate) async fn load_actor(
    users: &dyn UserRepository,
    actor: &Actor,
) -> Result<User, ApplicationError> {
    users
        .get_by_name(actor.name())
        .await
        .map_err(ApplicationError::on_not_found(
            ApplicationError::TokenUserNotFound,
        ))
}
