//! 点赞、评论、关注、通知与举报。

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use application::{services::RegisterCommentRequest, CommentView, NotificationView};
use domain::{CommentId, PostingId};

use crate::{
    auth::AuthUser,
    error::{ApiError, StatusBody},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
struct RegisterCommentPayload {
    posting_id: PostingId,
    #[validate(length(min = 1))]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct CommentsQuery {
    posting_id: PostingId,
}

#[derive(Debug, Serialize)]
struct FollowState {
    is_followed: bool,
}

#[derive(Debug, Deserialize, Validate)]
struct ReportPayload {
    #[validate(length(min = 1))]
    detail: String,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/likes/{posting_id}", post(register_like).delete(delete_like))
        .route("/comments", post(register_comment).get(list_comments))
        .route("/comments/{comment_id}", delete(delete_comment))
        .route(
            "/follows/{followed_user_name}",
            post(register_follow).delete(delete_follow).get(follow_state),
        )
        .route("/notifications", get(list_notifications))
        .route("/reports/users/{user_name}", post(report_user))
        .route("/reports/postings/{posting_id}", post(report_posting))
}

async fn register_like(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(posting_id): ApiPath<PostingId>,
) -> Result<Json<StatusBody>, ApiError> {
    state.services.likes.register(&actor, posting_id).await?;
    Ok(StatusBody::ok())
}

async fn delete_like(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(posting_id): ApiPath<PostingId>,
) -> Result<Json<StatusBody>, ApiError> {
    state.services.likes.delete(&actor, posting_id).await?;
    Ok(StatusBody::ok())
}

async fn register_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidatedJson(payload): ValidatedJson<RegisterCommentPayload>,
) -> Result<Json<CommentView>, ApiError> {
    let comment = state
        .services
        .comments
        .register(
            &actor,
            RegisterCommentRequest {
                posting_id: payload.posting_id,
                comment: payload.comment,
            },
        )
        .await?;
    Ok(Json(comment))
}

async fn list_comments(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(query): ApiQuery<CommentsQuery>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let comments = state
        .services
        .comments
        .list(&actor, query.posting_id)
        .await?;
    Ok(Json(comments))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(comment_id): ApiPath<CommentId>,
) -> Result<Json<StatusBody>, ApiError> {
    state.services.comments.delete(&actor, comment_id).await?;
    Ok(StatusBody::ok())
}

async fn register_follow(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(followed_user_name): ApiPath<String>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .follows
        .register(&actor, &followed_user_name)
        .await?;
    Ok(StatusBody::ok())
}

async fn delete_follow(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(followed_user_name): ApiPath<String>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .follows
        .delete(&actor, &followed_user_name)
        .await?;
    Ok(StatusBody::ok())
}

async fn follow_state(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(followed_user_name): ApiPath<String>,
) -> Result<Json<FollowState>, ApiError> {
    let is_followed = state
        .services
        .follows
        .is_following(&actor, &followed_user_name)
        .await?;
    Ok(Json(FollowState { is_followed }))
}

async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
    let notifications = state.services.notifications.list(&actor).await?;
    Ok(Json(notifications))
}

async fn report_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(user_name): ApiPath<String>,
    ValidatedJson(payload): ValidatedJson<ReportPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .reports
        .report_user(&actor, &user_name, payload.detail)
        .await?;
    Ok(StatusBody::ok())
}

async fn report_posting(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(posting_id): ApiPath<PostingId>,
    ValidatedJson(payload): ValidatedJson<ReportPayload>,
) -> Result<Json<StatusBody>, ApiError> {
    state
        .services
        .reports
        .report_posting(&actor, posting_id, payload.detail)
        .await?;
    Ok(StatusBody::ok())
}
