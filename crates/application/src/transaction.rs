//! 事务包装。
//!
//! `TransactionManager::begin` 打开一个读已提交隔离级别的事务，返回绑定在该事务上的
//! 仓储集合。[`run_in_transaction`] 在回调成功时提交、失败时回滚，并原样返回回调的错误。
//! 不支持嵌套：一个用例每次调用至多打开一个事务。

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    CommentRepository, FollowRepository, LikeRepository, NotificationRepository,
    PasswordResetRepository, PostingRepository, ReportRepository, RepositoryError,
    UserRepository,
};

use crate::error::ApplicationError;

/// 绑定在一个活动事务上的仓储集合。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn postings(&self) -> &dyn PostingRepository;
    fn likes(&self) -> &dyn LikeRepository;
    fn comments(&self) -> &dyn CommentRepository;
    fn follows(&self) -> &dyn FollowRepository;
    fn notifications(&self) -> &dyn NotificationRepository;
    fn password_resets(&self) -> &dyn PasswordResetRepository;
    fn reports(&self) -> &dyn ReportRepository;

    async fn commit(&self) -> Result<(), RepositoryError>;
    async fn rollback(&self) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TransactionManager: Send + Sync {
    async fn begin(&self) -> Result<Arc<dyn UnitOfWork>, RepositoryError>;
}

pub async fn run_in_transaction<T, F, Fut>(
    manager: &dyn TransactionManager,
    work: F,
) -> Result<T, ApplicationError>
where
    F: FnOnce(Arc<dyn UnitOfWork>) -> Fut,
    Fut: Future<Output = Result<T, ApplicationError>>,
{
    let tx = manager.begin().await?;
    match work(tx.clone()).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "事务回滚失败");
            }
            Err(err)
        }
    }
}
