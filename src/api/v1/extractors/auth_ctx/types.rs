/*
 * Responsibility
 * - The "authenticated context" type handlers see
 * - The gate verifies the token and stores this in request extensions; handlers
 *   receive only this type
 *
 * Notes
 * - Token verification lives in services/auth and middleware/auth
 */

use serde::Serialize;

use crate::services::auth::{role::Role, token_codec::VerifiedToken};

/// Identity attached to one authenticated request.
///
/// Only ever built from a `VerifiedToken`, and dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthCtx {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

impl From<VerifiedToken> for AuthCtx {
    fn from(token: VerifiedToken) -> Self {
        Self {
            user_id: token.user_id,
            email: token.email,
            role: token.role,
        }
    }
}
