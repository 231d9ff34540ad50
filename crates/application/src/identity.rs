use domain::UserName;

use crate::error::ApplicationError;

/// 已通过令牌校验的调用者。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    name: UserName,
}

impl Actor {
    pub fn new(name: UserName) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &UserName {
        &self.name
    }

    pub fn is_guest(&self) -> bool {
        self.name.is_guest()
    }

    /// 访客不能执行任何写操作。
    pub fn ensure_member(&self) -> Result<(), ApplicationError> {
        if self.is_guest() {
            return Err(ApplicationError::GuestForbidden);
        }
        Ok(())
    }
}
