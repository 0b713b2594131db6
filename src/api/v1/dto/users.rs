/*
 * Responsibility
 * - Users request/response DTOs
 * - Never exposes the password digest
 */
use serde::{Deserialize, Serialize};

use crate::repos::user_repo::UserRow;
use crate::services::auth::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            role: row.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserRoleChangeRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl UserChangePasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.old_password.is_empty() || self.new_password.is_empty() {
            return Err("oldPassword and newPassword are required");
        }
        Ok(())
    }
}
