use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};
use validator::Validate;

use application::services::LoginRequest;

use crate::{
    auth::{login_cookie, logout_cookie},
    error::{ApiError, StatusBody},
    extract::ValidatedJson,
    posting_routes, social_routes,
    state::AppState,
    user_routes,
};

#[derive(Debug, Deserialize, Validate)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    id_token: String,
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.http.cors_origins);

    let app = Router::new()
        .route("/health", get(liveness))
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .merge(user_routes::routes())
        .merge(posting_routes::routes())
        .merge(social_routes::routes())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "忽略无效的 CORS 来源");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

async fn liveness() -> Json<StatusBody> {
    StatusBody::ok()
}

/// 数据库不可达时返回 500
async fn readiness(State(state): State<AppState>) -> Result<Json<StatusBody>, ApiError> {
    state.health.readiness().await.map_err(|err| {
        error!(component = err.component, error = %err.reason, "就绪检查失败");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("readiness error: {} unavailable", err.component),
        )
    })?;
    Ok(StatusBody::ok())
}

async fn not_found() -> ApiError {
    ApiError::not_found("not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .services
        .auth
        .login(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    let cookie = login_cookie(&result.id_token, state.http.cookie_secure)?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            id_token: result.id_token,
        }),
    ))
}

/// 只清掉浏览器端的 Cookie，令牌本身在过期前依然有效
async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, logout_cookie(state.http.cookie_secure))],
        StatusBody::ok(),
    )
}
