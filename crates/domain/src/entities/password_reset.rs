use chrono::Duration;

use crate::value_objects::{PasswordResetKey, Timestamp, UserId};

/// 每个用户一行的密码重置状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordReset {
    pub user_id: UserId,
    pub email_count: i32,
    pub reset_key: PasswordResetKey,
    pub key_expires_at: Timestamp,
    pub updated_at: Timestamp,
}

impl PasswordReset {
    /// 今天（UTC）已经发送的重置邮件次数，跨天后归零。
    pub fn attempts_on(&self, now: Timestamp) -> i32 {
        if self.updated_at.date_naive() < now.date_naive() {
            0
        } else {
            self.email_count
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.key_expires_at <= now
    }

    /// 密钥匹配且未过期。
    pub fn accepts(&self, key: &PasswordResetKey, now: Timestamp) -> bool {
        &self.reset_key == key && !self.is_expired(now)
    }
}

/// 签发一把新密钥时写入的参数。
///
/// 当天计数由存储层在同一条语句里累加，当天已达 `daily_limit` 时不写入。
#[derive(Debug, Clone, Copy)]
pub struct PasswordResetUpsert {
    pub user_id: UserId,
    pub reset_key: PasswordResetKey,
    pub key_expires_at: Timestamp,
    pub updated_at: Timestamp,
    pub daily_limit: i32,
}

impl PasswordResetUpsert {
    pub fn issue(user_id: UserId, now: Timestamp, ttl: Duration, daily_limit: i32) -> Self {
        Self {
            user_id,
            reset_key: PasswordResetKey::generate(),
            key_expires_at: now + ttl,
            updated_at: now,
            daily_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reset_at(updated_at: Timestamp) -> PasswordReset {
        PasswordReset {
            user_id: UserId(1),
            email_count: 3,
            reset_key: PasswordResetKey::generate(),
            key_expires_at: updated_at + Duration::hours(24),
            updated_at,
        }
    }

    #[test]
    fn attempts_reset_on_a_new_day() {
        let morning = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let reset = reset_at(morning);
        assert_eq!(reset.attempts_on(morning + Duration::hours(10)), 3);
        assert_eq!(reset.attempts_on(morning + Duration::hours(17)), 0);
    }

    #[test]
    fn expired_or_wrong_keys_are_rejected() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let reset = reset_at(now);
        assert!(reset.accepts(&reset.reset_key, now));
        assert!(!reset.accepts(&PasswordResetKey::generate(), now));
        assert!(!reset.accepts(&reset.reset_key, now + Duration::hours(24)));
    }
}
