//! Web API 层。
//!
//! 提供 Axum 路由，把 HTTP 请求委托给应用层的用例服务，并把
//! [`application::ApplicationError`] 统一渲染成 `{status, message}`。

mod auth;
mod error;
mod extract;
mod posting_routes;
mod routes;
mod social_routes;
mod state;
mod user_routes;

pub use auth::{AuthUser, TOKEN_COOKIE};
pub use error::{ApiError, StatusBody};
pub use routes::router;
pub use state::{AppState, HttpSettings};
