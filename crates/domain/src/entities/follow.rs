use crate::value_objects::{FollowId, Timestamp, UserId};

/// 有序的关注关系：`following_user_id` 关注了 `followed_user_id`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Follow {
    pub id: FollowId,
    pub following_user_id: UserId,
    pub followed_user_id: UserId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct NewFollow {
    pub following_user_id: UserId,
    pub followed_user_id: UserId,
    pub created_at: Timestamp,
}
