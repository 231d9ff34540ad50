//! 用例返回给接口层的视图对象。

use domain::{Comment, Notification, Timestamp, User};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub user_name: String,
    pub icon: String,
    pub self_introduction: String,
    pub posting_count: i64,
    pub like_count: i64,
    pub liked_count: i64,
    pub follow_count: i64,
    pub followed_count: i64,
    pub created_at: Timestamp,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            user_name: user.name.to_string(),
            icon: user.icon,
            self_introduction: user.self_introduction,
            posting_count: user.counters.posting_count,
            like_count: user.counters.like_count,
            liked_count: user.counters.liked_count,
            follow_count: user.counters.follow_count,
            followed_count: user.counters.followed_count,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingView {
    pub posting_id: i64,
    pub user_name: String,
    pub uploaded_at: Timestamp,
    pub title: String,
    pub image_url: String,
    pub liked_count: i64,
    /// 当前调用者是否点过赞
    pub liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub comment_id: i64,
    pub posting_id: i64,
    pub user_name: String,
    pub commented_at: Timestamp,
    pub comment: String,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            comment_id: comment.id.0,
            posting_id: comment.posting_id.0,
            user_name: comment.user_name.to_string(),
            commented_at: comment.created_at,
            comment: comment.body.as_str().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub visitor_name: String,
    pub action_type: String,
    pub created_at: Timestamp,
}

impl From<Notification> for NotificationView {
    fn from(notification: Notification) -> Self {
        Self {
            visitor_name: notification.visitor_name.to_string(),
            action_type: notification.action.as_str().to_owned(),
            created_at: notification.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResult {
    pub id_token: String,
    pub user_name: String,
}
