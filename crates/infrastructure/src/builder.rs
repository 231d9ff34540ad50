use std::sync::Arc;
use std::time::Duration;

use application::{
    Clock, NotificationPublisher, ServiceDependencies, ServiceSettings, TokenService,
};
use config::AppConfig;
use thiserror::Error;
use tracing::info;

use crate::{
    db::create_pg_pool, health::PgHealthCheck, mail::LogMailer, migrations::MIGRATOR, password::BcryptPasswordHasher,
    repository::PgStorage, storage::LocalObjectStorage, transaction::PgTransactionManager,
};

#[derive(Debug, Clone)]
pub struct InfrastructureConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub bcrypt_cost: Option<u32>,
    pub storage_root: String,
    pub public_base_url: String,
    pub mail_sender: String,
}

impl From<&AppConfig> for InfrastructureConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            database_url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
            acquire_timeout: config.database.acquire_timeout(),
            bcrypt_cost: Some(config.auth.bcrypt_cost),
            storage_root: config.storage.root.clone(),
            public_base_url: config.storage.public_base_url.clone(),
            mail_sender: config.mail.sender.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[derive(Clone)]
pub struct Infrastructure {
    pub storage: Arc<PgStorage>,
    pub transactions: Arc<PgTransactionManager>,
    pub password_hasher: Arc<BcryptPasswordHasher>,
    pub object_storage: Arc<LocalObjectStorage>,
    pub mailer: Arc<LogMailer>,
    pub health: Arc<PgHealthCheck>,
}

impl Infrastructure {
    /// 建立连接池并执行迁移
    pub async fn connect(config: InfrastructureConfig) -> Result<Self, InfrastructureError> {
        let pool = create_pg_pool(
            &config.database_url,
            config.max_connections,
            config.min_connections,
            config.acquire_timeout,
        )
        .await?;
        MIGRATOR.run(&pool).await?;
        info!(
            max_connections = config.max_connections,
            "数据库连接池已就绪，迁移完成"
        );

        Ok(Self {
            storage: Arc::new(PgStorage::new(pool.clone())),
            health: Arc::new(PgHealthCheck::new(pool.clone())),
            transactions: Arc::new(PgTransactionManager::new(pool)),
            password_hasher: Arc::new(BcryptPasswordHasher::new(config.bcrypt_cost)),
            object_storage: Arc::new(LocalObjectStorage::new(
                config.storage_root,
                config.public_base_url,
            )),
            mailer: Arc::new(LogMailer::new(config.mail_sender)),
        })
    }

    /// 组装应用层所需的全部依赖
    pub fn service_dependencies(
        &self,
        token_service: Arc<dyn TokenService>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn NotificationPublisher>,
        settings: ServiceSettings,
    ) -> ServiceDependencies {
        let storage = &self.storage;
        ServiceDependencies {
            users: storage.user_repository.clone(),
            postings: storage.posting_repository.clone(),
            likes: storage.like_repository.clone(),
            comments: storage.comment_repository.clone(),
            follows: storage.follow_repository.clone(),
            notifications: storage.notification_repository.clone(),
            password_resets: storage.password_reset_repository.clone(),
            reports: storage.report_repository.clone(),
            transactions: self.transactions.clone(),
            password_hasher: self.password_hasher.clone(),
            token_service,
            clock,
            storage: self.object_storage.clone(),
            mailer: self.mailer.clone(),
            notifier,
            settings,
        }
    }
}
