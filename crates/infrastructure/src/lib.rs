//! 基础设施层实现。
//!
//! 提供 PostgreSQL 仓储与事务、bcrypt 密码哈希、JWT 令牌、本地对象存储和日志邮件发送器，
//! 实现应用/领域层定义的接口。

pub mod auth;
pub mod builder;
pub mod db;
pub mod health;
pub mod mail;
pub mod migrations;
pub mod password;
pub mod repository;
pub mod storage;
pub mod transaction;

pub use auth::JwtTokenService;
pub use builder::{Infrastructure, InfrastructureConfig, InfrastructureError};
pub use db::{create_pg_pool, DbPool, PgSession};
pub use health::PgHealthCheck;
pub use mail::LogMailer;
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use repository::PgStorage;
pub use storage::LocalObjectStorage;
pub use transaction::{PgTransactionManager, PgUnitOfWork};
