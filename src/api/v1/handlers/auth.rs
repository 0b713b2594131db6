/*
 * Responsibility
 * - POST /auth/signup, POST /auth/signin
 * - DTO validation, role parsing, then the account service issues the token
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::dto::auth::{SigninRequest, SignupRequest, TokenResponse},
    error::AppError,
    services::auth::{account, role::Role},
    state::AppState,
};

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;
    let role: Role = req.user_role.parse()?;

    let bearer_token = account::signup(
        state.users.as_ref(),
        &state.auth,
        &req.email,
        &req.password,
        role,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { bearer_token })))
}

pub async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_REQUEST", msg))?;

    let bearer_token =
        account::signin(state.users.as_ref(), &state.auth, &req.email, &req.password).await?;

    Ok(Json(TokenResponse { bearer_token }))
}
