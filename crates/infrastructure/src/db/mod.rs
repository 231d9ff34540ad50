//! 数据库会话与错误翻译。
//!
//! 同一个仓储实现既可以直接作用于连接池，也可以绑定在一个活动事务上，
//! 区别只在于构造时传入的 [`PgSession`]。

pub mod repositories;

use std::sync::Arc;

use domain::RepositoryError;
use sqlx::{
    pool::PoolConnection,
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::{Query, QueryAs},
    FromRow, PgConnection, PgPool, Postgres, Transaction,
};
use tokio::sync::{Mutex, MutexGuard};

pub type DbPool = PgPool;

pub(crate) type PgQuery<'q> = Query<'q, Postgres, PgArguments>;
pub(crate) type PgQueryAs<'q, R> = QueryAs<'q, Postgres, R, PgArguments>;

/// 事务句柄。提交或回滚后内部变为 `None`。
pub type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

#[derive(Clone)]
pub enum PgSession {
    Pool(PgPool),
    Tx(SharedTransaction),
}

impl PgSession {
    pub(crate) async fn acquire(&self) -> Result<SessionConnection<'_>, RepositoryError> {
        match self {
            Self::Pool(pool) => pool
                .acquire()
                .await
                .map(SessionConnection::Pooled)
                .map_err(map_sqlx_err),
            Self::Tx(tx) => Ok(SessionConnection::Tx(tx.lock().await)),
        }
    }

    pub(crate) async fn execute(&self, query: PgQuery<'_>) -> Result<u64, RepositoryError> {
        let mut conn = self.acquire().await?;
        let result = query
            .execute(conn.connection()?)
            .await
            .map_err(map_sqlx_err)?;
        Ok(result.rows_affected())
    }

    pub(crate) async fn fetch_one<R>(&self, query: PgQueryAs<'_, R>) -> Result<R, RepositoryError>
    where
        R: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let mut conn = self.acquire().await?;
        query
            .fetch_one(conn.connection()?)
            .await
            .map_err(map_sqlx_err)
    }

    pub(crate) async fn fetch_optional<R>(
        &self,
        query: PgQueryAs<'_, R>,
    ) -> Result<Option<R>, RepositoryError>
    where
        R: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let mut conn = self.acquire().await?;
        query
            .fetch_optional(conn.connection()?)
            .await
            .map_err(map_sqlx_err)
    }

    pub(crate) async fn fetch_all<R>(&self, query: PgQueryAs<'_, R>) -> Result<Vec<R>, RepositoryError>
    where
        R: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        let mut conn = self.acquire().await?;
        query
            .fetch_all(conn.connection()?)
            .await
            .map_err(map_sqlx_err)
    }
}

pub(crate) enum SessionConnection<'a> {
    Pooled(PoolConnection<Postgres>),
    Tx(MutexGuard<'a, Option<Transaction<'static, Postgres>>>),
}

impl SessionConnection<'_> {
    pub(crate) fn connection(&mut self) -> Result<&mut PgConnection, RepositoryError> {
        match self {
            Self::Pooled(conn) => Ok(&mut **conn),
            Self::Tx(guard) => match (**guard).as_mut() {
                Some(tx) => Ok(&mut **tx),
                None => Err(RepositoryError::storage("transaction already finished")),
            },
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
    min_connections: u32,
    acquire_timeout: std::time::Duration,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}

/// 唯一约束冲突翻译为 `Duplicate`，查询无结果翻译为 `NotFound`。
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if matches!(err, sqlx::Error::RowNotFound) {
        return RepositoryError::NotFound;
    }
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return RepositoryError::Duplicate;
        }
    }
    RepositoryError::storage_with_source(err.to_string(), err)
}

pub(crate) fn invalid_data(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::storage(format!("invalid stored data: {err}"))
}

/// `UPDATE` / `DELETE` 按主键作用于零行时视为不存在。
pub(crate) fn expect_affected(rows: u64) -> Result<(), RepositoryError> {
    if rows == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
