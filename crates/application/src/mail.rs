//! 邮件发送接口与邮件内容。

use async_trait::async_trait;
use domain::{ActivationKey, PasswordResetKey, UserEmail, UserName};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: UserEmail,
    pub subject: String,
    pub body: String,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// 邮件中链接的前缀。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailLinks {
    pub activation_url_prefix: String,
    pub password_reset_url_prefix: String,
}

impl Default for MailLinks {
    fn default() -> Self {
        Self {
            activation_url_prefix: "http://localhost:8080/user-activation".to_owned(),
            password_reset_url_prefix: "http://localhost:8080/password-reset".to_owned(),
        }
    }
}

impl MailLinks {
    pub fn activation_mail(
        &self,
        to: &UserEmail,
        name: &UserName,
        key: &ActivationKey,
    ) -> MailMessage {
        let link = format!(
            "{}/{}/{}",
            self.activation_url_prefix.trim_end_matches('/'),
            name,
            key
        );
        MailMessage {
            to: to.clone(),
            subject: "Activate your account".to_owned(),
            body: format!(
                "Hello {name},\n\nOpen the link below to activate your account.\n{link}\n"
            ),
        }
    }

    pub fn password_reset_mail(
        &self,
        to: &UserEmail,
        name: &UserName,
        key: &PasswordResetKey,
    ) -> MailMessage {
        let link = format!(
            "{}?user_name={}&password_reset_key={}",
            self.password_reset_url_prefix, name, key
        );
        MailMessage {
            to: to.clone(),
            subject: "Password reset".to_owned(),
            body: format!(
                "Hello {name},\n\nUse the link below within 24 hours to set a new password.\n{link}\n"
            ),
        }
    }
}
