use axum::{
    extract::State,
    routing::{delete, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use application::{
    services::{ListPostingsRequest, RegisterPostingRequest},
    PostingView,
};
use domain::{PostingId, Timestamp};

use crate::{
    auth::AuthUser,
    error::{ApiError, StatusBody},
    extract::{ApiPath, ApiQuery, ValidatedJson},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
struct RegisterPostingPayload {
    title: String,
    /// base64 编码的图片
    #[validate(length(min = 1))]
    image: String,
}

/// `since_at` 为 RFC3339 时间
#[derive(Debug, Deserialize)]
struct ListPostingsQuery {
    since_at: Option<Timestamp>,
    limit: Option<u32>,
    user_name: Option<String>,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/postings", post(register_posting).get(list_postings))
        .route("/postings/{posting_id}", delete(delete_posting))
}

async fn register_posting(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidatedJson(payload): ValidatedJson<RegisterPostingPayload>,
) -> Result<Json<PostingView>, ApiError> {
    let posting = state
        .services
        .postings
        .register(
            &actor,
            RegisterPostingRequest {
                title: payload.title,
                image: payload.image,
            },
        )
        .await?;

    Ok(Json(PostingView {
        posting_id: posting.id.0,
        user_name: posting.user_name.to_string(),
        uploaded_at: posting.created_at,
        title: posting.title.as_str().to_owned(),
        image_url: posting.image_url,
        liked_count: posting.liked_count,
        liked: false,
    }))
}

async fn list_postings(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiQuery(query): ApiQuery<ListPostingsQuery>,
) -> Result<Json<Vec<PostingView>>, ApiError> {
    let postings = state
        .services
        .postings
        .list(
            &actor,
            ListPostingsRequest {
                since_at: query.since_at,
                limit: query.limit,
                user_name: query.user_name,
            },
        )
        .await?;
    Ok(Json(postings))
}

async fn delete_posting(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ApiPath(posting_id): ApiPath<PostingId>,
) -> Result<Json<StatusBody>, ApiError> {
    state.services.postings.delete(&actor, posting_id).await?;
    Ok(StatusBody::ok())
}
