use application::{HealthCheck, HealthError};
use async_trait::async_trait;
use sqlx::PgPool;

/// 对连接池执行 `SELECT 1`。
pub struct PgHealthCheck {
    pool: PgPool,
}

impl PgHealthCheck {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PgHealthCheck {
    async fn readiness(&self) -> Result<(), HealthError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|err| HealthError::new("database", err.to_string()))
    }
}
