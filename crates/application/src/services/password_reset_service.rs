use std::sync::Arc;

use chrono::Duration;
use domain::{
    Password, PasswordResetKey, PasswordResetRepository, PasswordResetUpsert, UserEmail,
    UserName, UserRepository,
};

use crate::{
    clock::Clock,
    error::ApplicationError,
    mail::{MailLinks, Mailer},
    password::PasswordHasher,
    transaction::{run_in_transaction, TransactionManager},
};

#[derive(Debug, Clone)]
pub struct PasswordResetEmailRequest {
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct PasswordResetRequest {
    pub user_name: String,
    pub password: String,
    pub password_reset_key: String,
}

pub struct PasswordResetServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_reset_repository: Arc<dyn PasswordResetRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<dyn Mailer>,
    pub mail_links: MailLinks,
    pub daily_limit: i32,
    pub key_ttl: Duration,
}

pub struct PasswordResetService {
    deps: PasswordResetServiceDependencies,
}

impl PasswordResetService {
    pub fn new(deps: PasswordResetServiceDependencies) -> Self {
        Self { deps }
    }

    /// 签发重置密钥并发送邮件。同一用户每个 UTC 自然日最多 `daily_limit` 次。
    pub async fn send_reset_email(
        &self,
        request: PasswordResetEmailRequest,
    ) -> Result<(), ApplicationError> {
        let email = UserEmail::parse(request.email)?;
        let user = self
            .deps
            .user_repository
            .get_by_email(&email)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotExistsData))?;
        if user.is_guest() {
            return Err(ApplicationError::GuestForbidden);
        }

        let now = self.deps.clock.now();
        let reset = PasswordResetUpsert::issue(
            user.id,
            now,
            self.deps.key_ttl,
            self.deps.daily_limit,
        );
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            // 计数判断与写入在同一条语句里完成，并发请求不会越过上限
            tx.password_resets()
                .upsert(&reset)
                .await?
                .ok_or(ApplicationError::OverPasswordResetCount)?;
            let mail =
                self.deps
                    .mail_links
                    .password_reset_mail(&user.email, &user.name, &reset.reset_key);
            self.deps.mailer.send(mail).await?;
            Ok::<_, ApplicationError>(())
        })
        .await
    }

    /// 用户名、密钥不匹配或密钥过期统一返回 `NotExistsData`，不区分原因。
    pub async fn reset_password(
        &self,
        request: PasswordResetRequest,
    ) -> Result<(), ApplicationError> {
        let name =
            UserName::parse(request.user_name).map_err(|_| ApplicationError::NotExistsData)?;
        let key = PasswordResetKey::parse(&request.password_reset_key)
            .map_err(|_| ApplicationError::NotExistsData)?;
        let password = Password::parse(request.password)?;

        let user = self
            .deps
            .user_repository
            .get_by_name(&name)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotExistsData))?;
        let reset = self
            .deps
            .password_reset_repository
            .find_by_user(user.id)
            .await?
            .ok_or(ApplicationError::NotExistsData)?;

        let now = self.deps.clock.now();
        if !reset.accepts(&key, now) {
            return Err(ApplicationError::NotExistsData);
        }

        let hashed = self.deps.password_hasher.hash(password.as_str()).await?;
        let user_id = user.id;
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            tx.users().update_password(user_id, &hashed, now).await?;
            tx.password_resets().delete_by_user(user_id).await?;
            Ok::<_, ApplicationError>(())
        })
        .await?;

        tracing::info!(user_name = %name, "密码已重置");
        Ok(())
    }
}
