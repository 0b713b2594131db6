/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - token codec, user store, admin audit, admin path prefix
 * - Cloned per request, so everything inside is Arc / cheap to clone
 * - Read-only after startup; request-scoped data lives in request extensions
 */
use std::sync::Arc;

use crate::config::AdminPrefix;
use crate::repos::user_repo::UserStore;
use crate::services::{audit::AdminAudit, auth::TokenCodec};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<TokenCodec>,
    pub users: Arc<dyn UserStore>,
    pub audit: Arc<AdminAudit>,
    pub admin_prefix: AdminPrefix,
}

impl AppState {
    pub fn new(
        auth: Arc<TokenCodec>,
        users: Arc<dyn UserStore>,
        audit: Arc<AdminAudit>,
        admin_prefix: AdminPrefix,
    ) -> Self {
        Self {
            auth,
            users,
            audit,
            admin_prefix,
        }
    }
}
