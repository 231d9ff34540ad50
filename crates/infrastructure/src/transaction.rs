//! PostgreSQL 事务管理。
//!
//! `begin` 打开读已提交事务，返回一组共享同一事务句柄的仓储。
//! 未提交的事务在句柄被丢弃时由 sqlx 自动回滚。

use std::sync::Arc;

use application::{TransactionManager, UnitOfWork};
use async_trait::async_trait;
use domain::{
    CommentRepository, FollowRepository, LikeRepository, NotificationRepository,
    PasswordResetRepository, PostingRepository, ReportRepository, RepositoryError,
    UserRepository,
};
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::db::{
    map_sqlx_err,
    repositories::{
        PgCommentRepository, PgFollowRepository, PgLikeRepository, PgNotificationRepository,
        PgPasswordResetRepository, PgPostingRepository, PgReportRepository, PgUserRepository,
    },
    PgSession, SharedTransaction,
};

#[derive(Clone)]
pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    async fn begin(&self) -> Result<Arc<dyn UnitOfWork>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        Ok(Arc::new(PgUnitOfWork::new(Arc::new(Mutex::new(Some(tx))))))
    }
}

pub struct PgUnitOfWork {
    tx: SharedTransaction,
    users: PgUserRepository,
    postings: PgPostingRepository,
    likes: PgLikeRepository,
    comments: PgCommentRepository,
    follows: PgFollowRepository,
    notifications: PgNotificationRepository,
    password_resets: PgPasswordResetRepository,
    reports: PgReportRepository,
}

impl PgUnitOfWork {
    fn new(tx: SharedTransaction) -> Self {
        let session = PgSession::Tx(tx.clone());
        Self {
            users: PgUserRepository::new(session.clone()),
            postings: PgPostingRepository::new(session.clone()),
            likes: PgLikeRepository::new(session.clone()),
            comments: PgCommentRepository::new(session.clone()),
            follows: PgFollowRepository::new(session.clone()),
            notifications: PgNotificationRepository::new(session.clone()),
            password_resets: PgPasswordResetRepository::new(session.clone()),
            reports: PgReportRepository::new(session),
            tx,
        }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn postings(&self) -> &dyn PostingRepository {
        &self.postings
    }

    fn likes(&self) -> &dyn LikeRepository {
        &self.likes
    }

    fn comments(&self) -> &dyn CommentRepository {
        &self.comments
    }

    fn follows(&self) -> &dyn FollowRepository {
        &self.follows
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        &self.notifications
    }

    fn password_resets(&self) -> &dyn PasswordResetRepository {
        &self.password_resets
    }

    fn reports(&self) -> &dyn ReportRepository {
        &self.reports
    }

    async fn commit(&self) -> Result<(), RepositoryError> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| RepositoryError::storage("transaction already finished"))?;
        tx.commit().await.map_err(map_sqlx_err)
    }

    async fn rollback(&self) -> Result<(), RepositoryError> {
        match self.tx.lock().await.take() {
            Some(tx) => tx.rollback().await.map_err(map_sqlx_err),
            None => Ok(()),
        }
    }
}
