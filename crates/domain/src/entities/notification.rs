use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::{NotificationId, Timestamp, UserId, UserName};

/// 触发通知的动作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    Like,
    Comment,
    Follow,
}

impl NotificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Comment => "comment",
            Self::Follow => "follow",
        }
    }
}

impl fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationAction {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "like" => Ok(Self::Like),
            "comment" => Ok(Self::Comment),
            "follow" => Ok(Self::Follow),
            other => Err(DomainError::invalid_argument(
                "action",
                format!("unknown notification action `{other}`"),
            )),
        }
    }
}

/// 通知记录：访问者对被访问者做了某个动作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub visitor_user_id: UserId,
    pub visitor_name: UserName,
    pub visited_user_id: UserId,
    pub action: NotificationAction,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewNotification {
    pub visitor_user_id: UserId,
    pub visited_user_id: UserId,
    pub action: NotificationAction,
    pub created_at: Timestamp,
}
