//! 账号相关接口：注册、激活、资料、改密与找回密码。

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use application::{
    services::{
        ActivateUserRequest, ChangePasswordRequest, PasswordResetEmailRequest,
        PasswordResetRequest, RegisterUserRequest, UpdateUserRequest,
    },
    UserProfile,
};

use crate::{
    auth::{logout_cookie, AuthUser},
    error::{ApiError, StatusBody},
    extract::{ApiPath, ValidatedJson},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
struct RegisterUserPayload {
    user_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

/// 用户名放在路径里的注册请求
#[derive(Debug, Deserialize, Validate)]
struct RegisterNamedUserPayload {
    #[validate(email)]
    email: String,
    #[validate(length(min = 1))]
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
struct UpdateUserPayload {
    password: Option<String>,
    /// base64 编码的图片
    icon: Option<String>,
    self_introduction: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct ChangePasswordPayload {
    #[validate(length(min = 1))]
    old_password: String,
    #[validate(length(min = 1))]
    new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
struct PasswordResetEmailPayload {
    #[validate(email)]
    email: String,
}

#[derive(Debug, Deserialize, Validate)]
struct PasswordResetPayload {
    user_name: String,
    #[validate(length(min = 1))]
    password: String,
    password_reset_key: String,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route(
            "/users/{user_name}",
            post(register_named_user)
                .get(get_user)
                .put(update_user)
                .delete(delete_user),
        )
        .route(
            "/user-activation/{user_name}/{activation_key}",
            get(activate_user),
        )
        .route("/password", put(change_password))
        .route("/password-reset-email", post(send_password_reset_email))
        .route("/password-reset", post(reset_password))
}

async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterUserPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .users
        .register(RegisterUserRequest {
            user_name: payload.user_name,
            email: payload.email,
            password: payload.password,
        })
        .await?;
    Ok(StatusBody::ok())
}

async fn register_named_user(
    State(state): State<AppState>,
    ApiPath(user_name): ApiPath<String>,
    ValidatedJson(payload): ValidatedJson<RegisterNamedUserPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .users
        .register(RegisterUserRequest {
            user_name,
            email: payload.email,
            password: payload.password,
        })
        .await?;
    Ok(StatusBody::ok())
}

async fn activate_user(
    State(state): State<AppState>,
    ApiPath((user_name, activation_key)): ApiPath<(String, String)>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .users
        .activate(ActivateUserRequest {
            user_name,
            activation_key,
        })
        .await?;
    Ok(StatusBody::ok())
}

async fn get_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_name): ApiPath<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.services.users.get_profile(&actor, &user_name).await?;
    Ok(Json(profile))
}

async fn update_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_name): ApiPath<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUserPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .users
        .update(
            &actor,
            UpdateUserRequest {
                user_name,
                password: payload.password,
                icon: payload.icon,
                self_introduction: payload.self_introduction,
            },
        )
        .await?;
    Ok(StatusBody::ok())
}

/// 删除成功后顺带清掉登录 Cookie
async fn delete_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_name): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.delete(&actor, &user_name).await?;
    Ok((
        [(header::SET_COOKIE, logout_cookie(state.http.cookie_secure))],
        StatusBody::ok(),
    ))
}

async fn change_password(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .users
        .change_password(
            &actor,
            ChangePasswordRequest {
                old_password: payload.old_password,
                new_password: payload.new_password,
            },
        )
        .await?;
    Ok(StatusBody::ok())
}

async fn send_password_reset_email(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PasswordResetEmailPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .password_resets
        .send_reset_email(PasswordResetEmailRequest {
            email: payload.email,
        })
        .await?;
    Ok(StatusBody::ok())
}

async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<PasswordResetPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .password_resets
        .reset_password(PasswordResetRequest {
            user_name: payload.user_name,
            password: payload.password,
            password_reset_key: payload.password_reset_key,
        })
        .await?;
    Ok(StatusBody::ok())
}
