//! 调用者身份解析与登录 Cookie。
//!
//! 令牌来源按顺序：`Authorization: Bearer <token>`，然后是 `id_token` Cookie。

use application::Actor;
use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap, HeaderValue, StatusCode,
    },
};

use crate::{error::ApiError, state::AppState};

pub const TOKEN_COOKIE: &str = "id_token";

/// 已通过令牌校验的调用者。
#[derive(Debug, Clone)]
pub struct AuthUser(pub Actor);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or_else(|| ApiError::unauthorized("missing id token"))?;

        let actor = state.services.auth.authenticate(token)?;
        Ok(Self(actor))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(TOKEN_COOKIE), Some(token)) if !token.is_empty() => Some(token),
                _ => None,
            }
        })
}

/// 登录成功后下发的 Cookie
pub fn login_cookie(token: &str, secure: bool) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::try_from(cookie).map_err(|_| {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    })
}

/// 让浏览器立即丢弃登录 Cookie
pub fn logout_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("id_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("id_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
    }
}
