use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;

use super::{AuthCtx, binder};

/// Extractor that hands the authenticated identity to a handler.
///
/// Assumes the access middleware already inserted `AuthCtx` into
/// `request.extensions()`. A missing context or a wrapped type other than
/// `AuthCtx` is a wiring bug and rejects with 500, never 401.
pub struct Auth<T>(pub T);

impl<S, T> FromRequestParts<S> for Auth<T>
where
    S: Send + Sync,
    T: Send + 'static,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        binder::bind::<T>(parts.extensions.get::<AuthCtx>())
            .map(Auth)
            .map_err(|err| {
                tracing::error!(error = %err, path = %parts.uri.path(), "identity binding failed");
                AppError::from(err)
            })
    }
}
