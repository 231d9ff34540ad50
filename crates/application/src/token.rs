//! 身份令牌接口。

use domain::UserName;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
    #[error("not found name in token claims")]
    ClaimsMissing,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// 签发与校验带用户名声明、有时效的无状态令牌。
pub trait TokenService: Send + Sync {
    fn issue(&self, name: &UserName) -> Result<String, TokenError>;
    fn verify(&self, token: &str) -> Result<UserName, TokenError>;
}
