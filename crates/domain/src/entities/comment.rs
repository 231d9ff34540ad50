use crate::value_objects::{CommentBody, CommentId, PostingId, Timestamp, UserId, UserName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub user_name: UserName,
    pub posting_id: PostingId,
    pub body: CommentBody,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: UserId,
    pub posting_id: PostingId,
    pub body: CommentBody,
    pub created_at: Timestamp,
}
