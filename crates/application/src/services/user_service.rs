use std::sync::Arc;

use domain::{
    ActivationKey, ImageData, NewUser, Password, PostingRepository, SelfIntroduction, UserEmail,
    UserName, UserRepository,
};

use crate::{
    clock::Clock,
    dto::UserProfile,
    error::ApplicationError,
    identity::Actor,
    mail::{MailLinks, Mailer},
    password::PasswordHasher,
    services::load_actor,
    storage::{ObjectStorage, StorageBuckets},
    transaction::{run_in_transaction, TransactionManager},
};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ActivateUserRequest {
    pub user_name: String,
    pub activation_key: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserRequest {
    pub user_name: String,
    pub password: Option<String>,
    /// base64 编码的头像
    pub icon: Option<String>,
    pub self_introduction: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub posting_repository: Arc<dyn PostingRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn ObjectStorage>,
    pub buckets: StorageBuckets,
    pub mail_links: MailLinks,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    /// 注册并发送激活邮件。邮件发送失败时用户创建一并回滚。
    pub async fn register(&self, request: RegisterUserRequest) -> Result<UserName, ApplicationError> {
        let name = UserName::parse(request.user_name)?;
        let email = UserEmail::parse(request.email)?;
        let password = Password::parse(request.password)?;

        let hashed = self.deps.password_hasher.hash(password.as_str()).await?;
        let new_user = NewUser {
            name,
            email,
            password: hashed,
            activation_key: ActivationKey::generate(),
            created_at: self.deps.clock.now(),
        };

        let user = run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            let user = tx
                .users()
                .create(&new_user)
                .await
                .map_err(ApplicationError::on_duplicate(ApplicationError::DuplicateData))?;
            let mail = self.deps.mail_links.activation_mail(
                &user.email,
                &user.name,
                &user.activation_key,
            );
            self.deps.mailer.send(mail).await?;
            Ok::<_, ApplicationError>(user)
        })
        .await?;

        tracing::info!(user_name = %user.name, "用户注册成功");
        Ok(user.name)
    }

    pub async fn activate(&self, request: ActivateUserRequest) -> Result<(), ApplicationError> {
        let name = UserName::parse(request.user_name)?;
        let key = ActivationKey::parse(&request.activation_key)?;
        self.deps
            .user_repository
            .activate(&name, &key, self.deps.clock.now())
            .await
            .map_err(ApplicationError::on_not_found(
                ApplicationError::UserActivationNotFound,
            ))
    }

    pub async fn get_profile(
        &self,
        actor: &Actor,
        user_name: &str,
    ) -> Result<UserProfile, ApplicationError> {
        load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let name = UserName::parse(user_name)?;
        let user = self
            .deps
            .user_repository
            .get_by_name(&name)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotFound("user")))?;
        Ok(UserProfile::from(user))
    }

    pub async fn update(
        &self,
        actor: &Actor,
        request: UpdateUserRequest,
    ) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let user = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        if user.name.as_str() != request.user_name {
            return Err(ApplicationError::Forbidden(
                "you can only update your own account",
            ));
        }

        let password = request.password.map(Password::parse).transpose()?;
        let icon = request
            .icon
            .as_deref()
            .map(ImageData::decode_base64)
            .transpose()?;
        let self_introduction = request
            .self_introduction
            .map(SelfIntroduction::parse)
            .transpose()?;

        let password = match password {
            Some(password) => Some(self.deps.password_hasher.hash(password.as_str()).await?),
            None => None,
        };
        let icon_url = match icon {
            Some(image) => {
                let stored = self
                    .deps
                    .storage
                    .put(
                        &self.deps.buckets.icons,
                        user.name.as_str(),
                        image.content_type(),
                        image.into_bytes(),
                    )
                    .await?;
                Some(stored.url)
            }
            None => None,
        };

        let now = self.deps.clock.now();
        let user_id = user.id;
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            if let Some(hash) = &password {
                tx.users().update_password(user_id, hash, now).await?;
            }
            if let Some(url) = &icon_url {
                tx.users().update_icon(user_id, url, now).await?;
            }
            if let Some(text) = &self_introduction {
                tx.users().update_self_introduction(user_id, text, now).await?;
            }
            Ok::<_, ApplicationError>(())
        })
        .await
    }

    pub async fn change_password(
        &self,
        actor: &Actor,
        request: ChangePasswordRequest,
    ) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let user = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        let matched = self
            .deps
            .password_hasher
            .verify(&request.old_password, &user.password)
            .await?;
        if !matched {
            return Err(ApplicationError::NotCorrectPassword);
        }

        let new_password = Password::parse(request.new_password)?;
        let hashed = self.deps.password_hasher.hash(new_password.as_str()).await?;
        self.deps
            .user_repository
            .update_password(user.id, &hashed, self.deps.clock.now())
            .await?;
        Ok(())
    }

    /// 注销账号。按依赖顺序在一个事务内删除所有关联数据，
    /// 并回退该用户对其他用户与投稿计数器的贡献。
    pub async fn delete(&self, actor: &Actor, user_name: &str) -> Result<(), ApplicationError> {
        actor.ensure_member()?;
        let user = load_actor(self.deps.user_repository.as_ref(), actor).await?;
        if user.name.as_str() != user_name {
            return Err(ApplicationError::Forbidden(
                "you can only delete your own account",
            ));
        }

        let image_keys: Vec<String> = self
            .deps
            .posting_repository
            .list_by_user(user.id)
            .await?
            .into_iter()
            .map(|posting| posting.image_key)
            .collect();

        let user_id = user.id;
        run_in_transaction(self.deps.transactions.as_ref(), |tx| async move {
            tx.notifications().delete_by_user(user_id).await?;
            tx.password_resets().delete_by_user(user_id).await?;
            tx.reports().delete_user_reports(user_id).await?;
            tx.reports()
                .delete_posting_reports_on_postings_of(user_id)
                .await?;

            // 点赞：先回退计数器，再删行
            tx.users().decrement_liked_counts_for_likes_by(user_id).await?;
            tx.postings()
                .decrement_liked_counts_for_likes_by(user_id)
                .await?;
            tx.users()
                .decrement_like_counts_for_likes_on_postings_of(user_id)
                .await?;
            tx.likes().delete_by_user(user_id).await?;
            tx.likes().delete_on_postings_of(user_id).await?;

            tx.comments().delete_by_user(user_id).await?;
            tx.comments().delete_on_postings_of(user_id).await?;

            tx.users().decrement_follow_counts_for(user_id).await?;
            tx.follows().delete_by_user(user_id).await?;

            tx.postings().delete_by_user(user_id).await?;

            let deleted = tx.users().delete(user_id).await?;
            if deleted == 0 {
                return Err(ApplicationError::TokenUserNotFound);
            }
            Ok::<_, ApplicationError>(())
        })
        .await?;

        tracing::info!(user_name = %user.name, postings = image_keys.len(), "用户已注销");

        for key in &image_keys {
            if let Err(err) = self.deps.storage.delete(&self.deps.buckets.postings, key).await {
                tracing::error!(error = %err, key = %key, "删除投稿图片失败");
            }
        }
        if !user.icon.is_empty() {
            if let Err(err) = self
                .deps
                .storage
                .delete(&self.deps.buckets.icons, user.name.as_str())
                .await
            {
                tracing::error!(error = %err, "删除头像失败");
            }
        }
        Ok(())
    }
}
