//! 应用层：用例编排。
//!
//! 每个服务方法对应一个接口动作，组合仓储调用并在需要时通过
//! [`run_in_transaction`] 把多次写入放进同一个事务。

pub mod clock;
pub mod dto;
pub mod error;
pub mod health;
pub mod identity;
pub mod mail;
pub mod notifier;
pub mod password;
pub mod services;
pub mod storage;
pub mod token;
pub mod transaction;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use dto::{CommentView, LoginResult, NotificationView, PostingView, UserProfile};
pub use error::{ApplicationError, ErrorKind};
pub use health::{HealthCheck, HealthError};
pub use identity::Actor;
pub use mail::{MailError, MailLinks, MailMessage, Mailer};
pub use notifier::{DisabledNotifications, NotificationPublisher, StoredNotifications};
pub use password::{PasswordHasher, PasswordHasherError};
pub use services::{ServiceDependencies, ServiceSettings, Services};
pub use storage::{ObjectStorage, StorageBuckets, StorageError, StoredObject};
pub use token::{TokenError, TokenService};
pub use transaction::{run_in_transaction, TransactionManager, UnitOfWork};
