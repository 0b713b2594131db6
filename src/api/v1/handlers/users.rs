/*
 * Responsibility
 * - GET /users/me (identity comes from the bound AuthCtx)
 * - GET /users/{user_id}
 * - PUT /users/password (caller's own password, identity from AuthCtx)
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::v1::{
        dto::users::{UserChangePasswordRequest, UserResponse},
        extractors::{Auth, AuthCtx},
    },
    error::AppError,
    services::auth::account,
    state::AppState,
};

pub async fn get_me(
    State(state): State<AppState>,
    Auth(ctx): Auth<AuthCtx>,
) -> Result<Json<UserResponse>, AppError> {
    let row = state
        .users
        .get(ctx.user_id)
        .await
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let row = state
        .users
        .get(user_id)
        .await
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn change_password(
    State(state): State<AppState>,
    Auth(ctx): Auth<AuthCtx>,
    Json(req): Json<UserChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;

    account::change_password(
        state.users.as_ref(),
        ctx.user_id,
        &req.old_password,
        &req.new_password,
    )
    .await?;

    Ok(StatusCode::OK)
}
