use serde::{Deserialize, Serialize};

use crate::value_objects::{
    ActivationKey, PasswordHash, Timestamp, UserEmail, UserId, UserName,
};

/// 用户上反规范化保存的计数器。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounters {
    pub posting_count: i64,
    pub like_count: i64,
    pub liked_count: i64,
    pub follow_count: i64,
    pub followed_count: i64,
}

/// 可原子增减的用户计数器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserCounter {
    /// 发布的投稿数
    Postings,
    /// 给出的点赞数
    Likes,
    /// 收到的点赞数
    Liked,
    /// 关注的人数
    Follows,
    /// 粉丝数
    Followed,
}

impl UserCounter {
    /// 对应的数据库列名。
    pub fn column(&self) -> &'static str {
        match self {
            Self::Postings => "posting_count",
            Self::Likes => "like_count",
            Self::Liked => "liked_count",
            Self::Follows => "follow_count",
            Self::Followed => "followed_count",
        }
    }
}

impl UserCounters {
    pub fn get(&self, counter: UserCounter) -> i64 {
        match counter {
            UserCounter::Postings => self.posting_count,
            UserCounter::Likes => self.like_count,
            UserCounter::Liked => self.liked_count,
            UserCounter::Follows => self.follow_count,
            UserCounter::Followed => self.followed_count,
        }
    }

    pub fn add(&mut self, counter: UserCounter, delta: i64) {
        let slot = match counter {
            UserCounter::Postings => &mut self.posting_count,
            UserCounter::Likes => &mut self.like_count,
            UserCounter::Liked => &mut self.liked_count,
            UserCounter::Follows => &mut self.follow_count,
            UserCounter::Followed => &mut self.followed_count,
        };
        *slot += delta;
    }
}

/// 用户聚合。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: UserName,
    pub email: UserEmail,
    pub password: PasswordHash,
    pub icon: String,
    pub self_introduction: String,
    pub counters: UserCounters,
    pub activation_key: ActivationKey,
    pub email_verified: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn is_guest(&self) -> bool {
        self.name.is_guest()
    }
}

/// 注册时写入的新用户。
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: UserName,
    pub email: UserEmail,
    pub password: PasswordHash,
    pub activation_key: ActivationKey,
    pub created_at: Timestamp,
}
