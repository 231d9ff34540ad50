use std::sync::Arc;

use domain::{UserEmail, UserRepository};

use crate::{
    dto::LoginResult, error::ApplicationError, identity::Actor, password::PasswordHasher,
    token::TokenService,
};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_service: Arc<dyn TokenService>,
    pub guest_passwordless_login: bool,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResult, ApplicationError> {
        let email = UserEmail::parse(request.email)?;
        let user = self
            .deps
            .user_repository
            .get_by_email(&email)
            .await
            .map_err(ApplicationError::on_not_found(ApplicationError::NotExistsData))?;

        if !user.email_verified {
            return Err(ApplicationError::NotVerifiedUser);
        }

        let skip_password = user.is_guest() && self.deps.guest_passwordless_login;
        if skip_password {
            tracing::info!("访客账号免密登录");
        } else {
            let matched = self
                .deps
                .password_hasher
                .verify(&request.password, &user.password)
                .await?;
            if !matched {
                return Err(ApplicationError::NotCorrectPassword);
            }
        }

        let id_token = self.deps.token_service.issue(&user.name)?;
        Ok(LoginResult {
            id_token,
            user_name: user.name.to_string(),
        })
    }

    /// 校验令牌并得到调用者身份，不访问数据库。
    pub fn authenticate(&self, token: &str) -> Result<Actor, ApplicationError> {
        let name = self.deps.token_service.verify(token)?;
        Ok(Actor::new(name))
    }
}
