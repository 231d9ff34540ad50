use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::{mail::MailError, password::PasswordHasherError, storage::StorageError, token::TokenError};

/// 错误的大类，Web 层据此选择 HTTP 状态码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("password error: {0}")]
    Password(#[from] PasswordHasherError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("object storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("mail error: {0}")]
    Mail(#[from] MailError),

    #[error("the user name or email has been already used")]
    DuplicateData,
    #[error("not exists data error")]
    NotExistsData,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("wrong user_name or activation_key, or might be already activated")]
    UserActivationNotFound,
    #[error("not email verified user")]
    NotVerifiedUser,
    #[error("not correct password")]
    NotCorrectPassword,
    #[error("you can't reset password as it exceeds limit counts")]
    OverPasswordResetCount,
    #[error("the user name contained in token doesn't exist")]
    TokenUserNotFound,
    #[error("not allowed to guest user")]
    GuestForbidden,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("you can't like your posting")]
    LikeYourSelf,
    #[error("Whoops, you already liked the posting")]
    AlreadyLiked,
    #[error("you have not liked the posting")]
    DeleteNotExistsLike,
    #[error("you can't follow yourself")]
    FollowYourself,
    #[error("you already followed the user")]
    AlreadyFollowed,
    #[error("you have not followed the user")]
    DeleteNotExistsFollow,
    #[error("the user doesn't exist")]
    UserNotExists,
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::BadRequest,
            Self::Repository(RepositoryError::NotFound) => ErrorKind::NotFound,
            Self::Repository(RepositoryError::Duplicate) => ErrorKind::Conflict,
            Self::Repository(RepositoryError::Storage { .. }) => ErrorKind::Internal,
            Self::Password(_) => ErrorKind::Internal,
            Self::Token(TokenError::Encoding(_)) => ErrorKind::Internal,
            Self::Token(TokenError::Expired | TokenError::Invalid | TokenError::ClaimsMissing) => {
                ErrorKind::Unauthorized
            }
            Self::Storage(_) | Self::Mail(_) => ErrorKind::Internal,
            Self::DuplicateData => ErrorKind::Conflict,
            Self::NotExistsData => ErrorKind::BadRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::UserActivationNotFound => ErrorKind::BadRequest,
            Self::NotVerifiedUser => ErrorKind::BadRequest,
            Self::NotCorrectPassword => ErrorKind::BadRequest,
            Self::OverPasswordResetCount => ErrorKind::BadRequest,
            Self::TokenUserNotFound => ErrorKind::Unauthorized,
            Self::GuestForbidden => ErrorKind::Forbidden,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::LikeYourSelf => ErrorKind::BadRequest,
            Self::AlreadyLiked => ErrorKind::Conflict,
            Self::DeleteNotExistsLike => ErrorKind::Conflict,
            Self::FollowYourself => ErrorKind::BadRequest,
            Self::AlreadyFollowed => ErrorKind::Conflict,
            Self::DeleteNotExistsFollow => ErrorKind::Conflict,
            Self::UserNotExists => ErrorKind::Conflict,
        }
    }

    /// 把仓储的 `NotFound` 替换为指定的业务错误，其余错误原样转换。
    pub fn on_not_found(replacement: Self) -> impl FnOnce(RepositoryError) -> Self {
        move |err| match err {
            RepositoryError::NotFound => replacement,
            other => Self::from(other),
        }
    }

    /// 把仓储的 `Duplicate` 替换为指定的业务错误，其余错误原样转换。
    pub fn on_duplicate(replacement: Self) -> impl FnOnce(RepositoryError) -> Self {
        move |err| match err {
            RepositoryError::Duplicate => replacement,
            other => Self::from(other),
        }
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Repository(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_sentinels_can_be_rewritten() {
        let err = ApplicationError::on_not_found(ApplicationError::NotFound("posting"))(
            RepositoryError::NotFound,
        );
        assert!(matches!(err, ApplicationError::NotFound("posting")));

        let err = ApplicationError::on_not_found(ApplicationError::NotFound("posting"))(
            RepositoryError::Duplicate,
        );
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = ApplicationError::on_duplicate(ApplicationError::AlreadyLiked)(
            RepositoryError::Duplicate,
        );
        assert_eq!(err.to_string(), "Whoops, you already liked the posting");
    }

    #[test]
    fn storage_failures_are_internal() {
        let err = ApplicationError::from(RepositoryError::storage("connection reset"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(ApplicationError::GuestForbidden.kind(), ErrorKind::Forbidden);
        assert_eq!(
            ApplicationError::Token(TokenError::Expired).kind(),
            ErrorKind::Unauthorized
        );
    }
}
