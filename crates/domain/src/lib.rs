//! 领域模型核心 crate。
//!
//! 包含用户、投稿、点赞、评论、关注、通知、密码重置与举报等实体，
//! 经过验证的值对象，以及仓储接口（不依赖任何具体存储）。

pub mod entities;
pub mod errors;
pub mod image;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use errors::{DomainError, RepositoryError};
pub use image::{ImageData, ImageFormat};
pub use repositories::*;
pub use value_objects::*;
