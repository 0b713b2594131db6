/*
 * Responsibility
 * - /admin/users handlers (ADMIN only; gated and audited by middleware)
 * - list_users returns a plain body, change_user_role an Envelope
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    api::v1::{
        dto::{
            envelope::Envelope,
            users::{UserResponse, UserRoleChangeRequest},
        },
        extractors::{Auth, AuthCtx},
    },
    error::AppError,
    services::auth::role::Role,
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    Auth(ctx): Auth<AuthCtx>,
) -> Json<Vec<UserResponse>> {
    tracing::debug!(actor = ctx.user_id, "listing users");
    let users = state
        .users
        .list()
        .await
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Json(users)
}

pub async fn change_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<UserRoleChangeRequest>,
) -> Result<Envelope<UserResponse>, AppError> {
    let role: Role = req.role.parse()?;

    let row = state
        .users
        .update_role(user_id, role)
        .await
        .ok_or(AppError::not_found("user"))?;

    tracing::info!(user_id = row.id, role = %row.role, "user role changed");
    Ok(Envelope::ok(row.into()))
}
