//! 把邮件写进日志的发送器，用于开发与测试环境。

use application::{MailError, MailMessage, Mailer};
use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }

    pub fn render(&self, message: &MailMessage) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\n\r\n{}",
            self.sender, message.to, message.subject, message.body
        )
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        debug!(
            from = %self.sender,
            to = %message.to,
            subject = %message.subject,
            "\n{}",
            self.render(&message)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::UserEmail;

    #[tokio::test]
    async fn renders_headers_and_body() {
        let mailer = LogMailer::new("no-reply@pawprint.test");
        let message = MailMessage {
            to: UserEmail::parse("alice@example.com").unwrap(),
            subject: "Password reset".to_string(),
            body: "link".to_string(),
        };

        let text = mailer.render(&message);
        assert!(text.starts_with("From: no-reply@pawprint.test\r\nTo: alice@example.com\r\n"));
        assert!(text.ends_with("\r\n\r\nlink"));
        mailer.send(message).await.unwrap();
    }
}
