//! Access token verification → AuthCtx into request extensions.
//!
//! Per request: no header → extracted → verified → bound, or rejected at any
//! step. Every authentication failure is a 401; an authenticated non-admin on
//! the admin prefix is a 403. The internal reason is kept on `GateRejection`
//! and logged, never sent to the client.

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};
use thiserror::Error;

use crate::api::v1::extractors::AuthCtx;
use crate::config::AdminPrefix;
use crate::error::AppError;
use crate::services::auth::{
    role::Role,
    token_codec::{self, TokenCodec, TokenError},
};
use crate::state::AppState;

/// Put every route of `router` behind authentication (and the admin role gate).
///
/// Example:
/// ```ignore
/// let protected = api::v1::protected_routes();
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // route_layer: only matched routes are gated, unknown paths stay 404
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

#[derive(Debug, Error)]
pub enum GateRejection {
    #[error("authorization header missing")]
    NoHeader,
    #[error("authorization header is not a bearer credential: {0}")]
    Extract(#[source] TokenError),
    #[error("token verification failed: {0}")]
    Verify(#[source] TokenError),
    #[error("role {role} may not access {path}")]
    Forbidden { role: Role, path: String },
}

impl GateRejection {
    pub fn stage(&self) -> &'static str {
        match self {
            GateRejection::NoHeader => "no_header",
            GateRejection::Extract(_) => "extract",
            GateRejection::Verify(_) => "verify",
            GateRejection::Forbidden { .. } => "role",
        }
    }
}

impl From<GateRejection> for AppError {
    fn from(rejection: GateRejection) -> Self {
        match rejection {
            GateRejection::NoHeader | GateRejection::Extract(_) | GateRejection::Verify(_) => {
                AppError::Unauthenticated
            }
            GateRejection::Forbidden { .. } => AppError::Forbidden,
        }
    }
}

/// Derive the request identity from its `Authorization` header.
pub fn authenticate(codec: &TokenCodec, headers: &HeaderMap) -> Result<AuthCtx, GateRejection> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateRejection::NoHeader)?
        .to_str()
        .map_err(|_| GateRejection::Extract(TokenError::Malformed))?;

    let jwt = token_codec::strip_scheme(raw).map_err(GateRejection::Extract)?;

    let verified = codec.verify_jwt(jwt).map_err(GateRejection::Verify)?;

    Ok(AuthCtx::from(verified))
}

/// Role gate: paths under the admin prefix require `Role::Admin`.
pub fn authorize(prefix: &AdminPrefix, path: &str, ctx: &AuthCtx) -> Result<(), GateRejection> {
    if prefix.matches(path) && !ctx.role.is_admin() {
        return Err(GateRejection::Forbidden {
            role: ctx.role,
            path: path.to_string(),
        });
    }
    Ok(())
}

async fn access_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = original_uri.path();

    let auth_ctx = authenticate(&state.auth, req.headers())
        .and_then(|ctx| authorize(&state.admin_prefix, path, &ctx).map(|()| ctx))
        .map_err(|rejection| {
            tracing::warn!(
                stage = rejection.stage(),
                error = %rejection,
                path,
                "request rejected by access gate"
            );
            AppError::from(rejection)
        })?;

    tracing::debug!(user_id = auth_ctx.user_id, role = %auth_ctx.role, "request authenticated");

    // middleware → extractor handoff
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
