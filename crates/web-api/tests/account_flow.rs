mod support;

use std::sync::Arc;

use application::{
    health::MockHealthCheck,
    testing::{FixedClock, TEST_PASSWORD},
    HealthError, ServiceSettings, TokenService,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use chrono::Duration;
use config::JwtConfig;
use infrastructure::JwtTokenService;
use serde_json::json;
use support::{fake_token, request, TestServer};

fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "0123456789abcdef0123456789abcdef".to_owned(),
        issuer: "pawprint".to_owned(),
        expiration_hours: 24,
    }
}

async fn register_and_activate(server: &TestServer, name: &str) {
    let response = server
        .call(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user_name": name,
                "email": format!("{name}@example.com"),
                "password": TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let key = server.app.user(name).activation_key;
    let response = server
        .call(
            Method::GET,
            &format!("/user-activation/{name}/{key}"),
            None,
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn health_answers_with_envelope() {
    let server = TestServer::new();

    let response = server.call(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"status": 200, "message": "ok"}));
}

#[tokio::test]
async fn liveness_and_readiness_when_database_is_up() {
    let server = TestServer::new();

    let live = server.call(Method::GET, "/health/liveness", None, None).await;
    assert_eq!(live.status, StatusCode::OK);

    let ready = server.call(Method::GET, "/health/readiness", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body, json!({"status": 200, "message": "ok"}));
}

#[tokio::test]
async fn readiness_fails_when_database_is_down() {
    let mut health = MockHealthCheck::new();
    health
        .expect_readiness()
        .times(1)
        .returning(|| Err(HealthError::new("database", "connection refused")));
    let server = TestServer::with_health(Arc::new(health));

    let response = server.call(Method::GET, "/health/readiness", None, None).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["status"], 500);
    assert_eq!(response.message(), "readiness error: database unavailable");

    let live = server.call(Method::GET, "/health", None, None).await;
    assert_eq!(live.status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_path_and_wrong_method_use_envelope() {
    let server = TestServer::new();

    let response = server.call(Method::GET, "/nowhere", None, None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["status"], 404);

    let response = server.call(Method::DELETE, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.body["status"], 405);
}

#[tokio::test]
async fn register_activate_login_with_jwt() {
    let clock = Arc::new(FixedClock::default());
    let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(&jwt_config(), clock.clone()));
    let server = TestServer::with(ServiceSettings::default(), tokens.clone());

    register_and_activate(&server, "alice").await;
    let activation_mail = server.app.mailer.last_to("alice@example.com");
    assert!(activation_mail.is_some());

    let response = server
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "alice@example.com", "password": TEST_PASSWORD})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let token = response.body["id_token"].as_str().expect("id_token");
    assert_eq!(tokens.verify(token).unwrap().as_str(), "alice");

    let cookie = response.set_cookie().expect("login cookie");
    assert!(cookie.starts_with(&format!("id_token={token}")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Path=/"));

    let profile = server
        .call(Method::GET, "/users/alice", Some(token), None)
        .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["user_name"], "alice");

    clock.advance(Duration::hours(24));
    let expired = server
        .call(Method::GET, "/users/alice", Some(token), None)
        .await;
    assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired.message(), "token expired");
}

#[tokio::test]
async fn login_rejections() {
    let server = TestServer::new();

    let response = server
        .call(
            Method::POST,
            "/users/bob",
            None,
            Some(json!({"email": "bob@example.com", "password": TEST_PASSWORD})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let unverified = server
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "bob@example.com", "password": TEST_PASSWORD})),
        )
        .await;
    assert_eq!(unverified.status, StatusCode::BAD_REQUEST);
    assert_eq!(unverified.message(), "not email verified user");

    let unknown = server
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": TEST_PASSWORD})),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);

    server.app.register_active_user("carol").await;
    let wrong = server
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "carol@example.com", "password": "Wrong123456"})),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong.message(), "not correct password");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let server = TestServer::new();
    register_and_activate(&server, "alice").await;

    let response = server
        .call(
            Method::POST,
            "/users",
            None,
            Some(json!({
                "user_name": "alice",
                "email": "other@example.com",
                "password": TEST_PASSWORD,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let again = server
        .call(
            Method::GET,
            &format!(
                "/user-activation/alice/{}",
                server.app.user("alice").activation_key
            ),
            None,
            None,
        )
        .await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let server = TestServer::new();

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\":"))
        .unwrap();
    let response = server.send(broken).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["status"], 400);

    let missing_field = server
        .call(
            Method::POST,
            "/users",
            None,
            Some(json!({"user_name": "alice", "email": "alice@example.com"})),
        )
        .await;
    assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);

    let bad_email = server
        .call(
            Method::POST,
            "/password-reset-email",
            None,
            Some(json!({"email": "not-an-email"})),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_from_header_or_cookie() {
    let server = TestServer::new();
    server.app.register_active_user("alice").await;

    let missing = server
        .call(Method::GET, "/notifications", None, None)
        .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = server
        .call(Method::GET, "/notifications", Some("garbage"), None)
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let by_cookie = Request::builder()
        .method(Method::GET)
        .uri("/notifications")
        .header(header::COOKIE, format!("theme=dark; id_token={}", fake_token("alice")))
        .body(Body::empty())
        .unwrap();
    assert_eq!(server.send(by_cookie).await.status, StatusCode::OK);

    // Bearer 优先于 Cookie
    let mut both = request(
        Method::GET,
        "/notifications",
        Some(&fake_token("alice")),
        None,
    );
    both.headers_mut()
        .insert(header::COOKIE, "id_token=garbage".parse().unwrap());
    assert_eq!(server.send(both).await.status, StatusCode::OK);

    let ghost = server
        .call(Method::GET, "/notifications", Some(&fake_token("ghost")), None)
        .await;
    assert_eq!(ghost.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        ghost.message(),
        "the user name contained in token doesn't exist"
    );
}

#[tokio::test]
async fn logout_clears_cookie() {
    let server = TestServer::new();

    let response = server.call(Method::POST, "/logout", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    let cookie = response.set_cookie().expect("cookie");
    assert!(cookie.starts_with("id_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn change_password_then_login() {
    let server = TestServer::new();
    server.app.register_active_user("alice").await;
    let token = fake_token("alice");

    let wrong_old = server
        .call(
            Method::PUT,
            "/password",
            Some(&token),
            Some(json!({"old_password": "Wrong123456", "new_password": "Changed98765"})),
        )
        .await;
    assert_eq!(wrong_old.status, StatusCode::BAD_REQUEST);

    let changed = server
        .call(
            Method::PUT,
            "/password",
            Some(&token),
            Some(json!({"old_password": TEST_PASSWORD, "new_password": "Changed98765"})),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    let login = server
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "Changed98765"})),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_flow() {
    let server = TestServer::new();
    server.app.register_active_user("alice").await;

    let response = server
        .call(
            Method::POST,
            "/password-reset-email",
            None,
            Some(json!({"email": "alice@example.com"})),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let user_id = server.app.user("alice").id;
    let key = server.app.store.snapshot().password_resets[&user_id.0]
        .reset_key
        .to_string();

    // 过期的 key 与不存在的数据同样处理
    server.app.clock.advance(Duration::hours(25));
    let expired = server
        .call(
            Method::POST,
            "/password-reset",
            None,
            Some(json!({
                "user_name": "alice",
                "password": "Changed98765",
                "password_reset_key": key,
            })),
        )
        .await;
    assert_eq!(expired.status, StatusCode::BAD_REQUEST);
    assert_eq!(expired.message(), "not exists data error");

    let old_login = server
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({"email": "alice@example.com", "password": TEST_PASSWORD})),
        )
        .await;
    assert_eq!(old_login.status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_daily_limit() {
    let server = TestServer::new();
    server.app.register_active_user("alice").await;

    for _ in 0..3 {
        let response = server
            .call(
                Method::POST,
                "/password-reset-email",
                None,
                Some(json!({"email": "alice@example.com"})),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let over = server
        .call(
            Method::POST,
            "/password-reset-email",
            None,
            Some(json!({"email": "alice@example.com"})),
        )
        .await;
    assert_eq!(over.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        over.message(),
        "you can't reset password as it exceeds limit counts"
    );
}
