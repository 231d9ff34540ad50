use crate::value_objects::{LikeId, PostingId, Timestamp, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Like {
    pub id: LikeId,
    pub user_id: UserId,
    pub posting_id: PostingId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct NewLike {
    pub user_id: UserId,
    pub posting_id: PostingId,
    pub created_at: Timestamp,
}
