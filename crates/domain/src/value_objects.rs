use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::errors::DomainError;

/// 统一的时间戳类型。
pub type Timestamp = DateTime<Utc>;

/// 保留的访客账号名。访客只能执行只读操作。
pub const GUEST_USER_NAME: &str = "guest";

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_id!(
    /// 用户主键。
    UserId
);
define_id!(
    /// 投稿主键。
    PostingId
);
define_id!(
    /// 点赞主键。
    LikeId
);
define_id!(
    /// 评论主键。
    CommentId
);
define_id!(
    /// 关注关系主键。
    FollowId
);
define_id!(NotificationId);
define_id!(ReportId);

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// 经过验证的用户名：仅 ASCII 字母数字，2 到 255 个字符。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let len = char_len(&value);
        if !(2..=255).contains(&len) {
            return Err(DomainError::invalid_argument(
                "user_name",
                "the length must be between 2 and 255",
            ));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_argument(
                "user_name",
                "must contain only letters and numbers",
            ));
        }
        Ok(Self(value))
    }

    pub fn guest() -> Self {
        Self(GUEST_USER_NAME.to_owned())
    }

    pub fn is_guest(&self) -> bool {
        self.0 == GUEST_USER_NAME
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for UserName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

/// 邮箱地址。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserEmail(String);

impl UserEmail {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_owned();
        let len = char_len(&value);
        if !(2..=255).contains(&len) {
            return Err(DomainError::invalid_argument(
                "email",
                "the length must be between 2 and 255",
            ));
        }
        if !value.validate_email() {
            return Err(DomainError::invalid_argument(
                "email",
                "must be a valid email address",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 明文密码，仅在请求处理期间存在。
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 8;

    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.len() < Self::MIN_LENGTH {
            return Err(DomainError::invalid_argument(
                "password",
                "must be at least 8 characters",
            ));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::invalid_argument(
                "password",
                "must contain only letters and numbers",
            ));
        }
        let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = value.chars().any(|c| c.is_ascii_lowercase());
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        if !(has_upper && has_lower && has_digit) {
            return Err(DomainError::invalid_argument(
                "password",
                "must contain upper case, lower case and a number",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// 密码哈希值。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.is_empty() {
            return Err(DomainError::invalid_argument(
                "password_hash",
                "cannot be empty",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}

fn bounded_text(
    field: &'static str,
    value: String,
    min: usize,
    max: usize,
) -> Result<String, DomainError> {
    let value = value.trim().to_owned();
    let len = char_len(&value);
    if len < min || len > max {
        return Err(DomainError::invalid_argument(
            field,
            format!("the length must be between {min} and {max}"),
        ));
    }
    Ok(value)
}

/// 投稿标题。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingTitle(String);

impl PostingTitle {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        bounded_text("title", value.into(), 2, 255).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 评论正文。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentBody(String);

impl CommentBody {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        bounded_text("comment", value.into(), 2, 255).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 自我介绍，可以为空。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelfIntroduction(String);

impl SelfIntroduction {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        bounded_text("self_introduction", value.into(), 0, 1000).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 举报详情。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDetail(String);

impl ReportDetail {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        bounded_text("detail", value.into(), 1, 1000).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 邮箱激活密钥。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivationKey(Uuid);

impl ActivationKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| DomainError::invalid_argument("activation_key", "must be a UUID"))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ActivationKey {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ActivationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 密码重置密钥。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PasswordResetKey(Uuid);

impl PasswordResetKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| DomainError::invalid_argument("password_reset_key", "must be a UUID"))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for PasswordResetKey {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PasswordResetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
