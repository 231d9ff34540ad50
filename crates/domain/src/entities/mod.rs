//! 领域实体。

pub mod comment;
pub mod follow;
pub mod like;
pub mod notification;
pub mod password_reset;
pub mod posting;
pub mod report;
pub mod user;

pub use comment::{Comment, NewComment};
pub use follow::{Follow, NewFollow};
pub use like::{Like, NewLike};
pub use notification::{NewNotification, Notification, NotificationAction};
pub use password_reset::{PasswordReset, PasswordResetUpsert};
pub use posting::{NewPosting, Posting, PostingQuery};
pub use report::{NewPostingReport, NewUserReport, PostingReport, UserReport};
pub use user::{NewUser, User, UserCounter, UserCounters};
