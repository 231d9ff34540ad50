use crate::value_objects::{PostingId, PostingTitle, Timestamp, UserId, UserName};

/// 投稿。`user_name` 由查询时联表得到。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub id: PostingId,
    pub user_id: UserId,
    pub user_name: UserName,
    pub title: PostingTitle,
    pub image_url: String,
    pub image_key: String,
    pub liked_count: i64,
    /// 两阶段删除的标记；非空时投稿对列表不可见。
    pub deleting_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Posting {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewPosting {
    pub user_id: UserId,
    pub title: PostingTitle,
    pub image_url: String,
    pub image_key: String,
    pub created_at: Timestamp,
}

/// 投稿列表查询：`created_at < since`，按时间倒序。
#[derive(Debug, Clone, Copy)]
pub struct PostingQuery {
    pub since: Timestamp,
    pub limit: u32,
    pub user_id: Option<UserId>,
}
