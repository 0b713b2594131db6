//! Admin API audit middleware.
//!
//! Adapts `AdminAudit::intercept` to axum: the JSON request body is the
//! request payload, the JSON response body the response payload. A response
//! produced from an `AppError` (or any 4xx/5xx) counts as a failure of the
//! wrapped handler and is passed back untouched. A request body that cannot
//! be buffered is still audited (request line with a placeholder, error line)
//! and answered with 413 when it exceeded the size limit.
//!
//! Must sit inside the access middleware so the actor is already known.

use std::error::Error as StdError;
use std::fmt;

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    extract::{MatchedPath, OriginalUri, State},
    http::{Request, StatusCode, response::Parts as ResponseParts},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use http_body_util::LengthLimitError;
use serde::{Serialize, Serializer};

use crate::api::v1::extractors::AuthCtx;
use crate::error::{AppError, FailureMessage};
use crate::services::audit::{AuditedCall, UNRENDERABLE_PAYLOAD, render_payload};
use crate::state::AppState;

// Same ceiling as the global request body limit.
const AUDIT_BODY_LIMIT: usize = 1024 * 1024;

/// Audit every route of `router`; applied to the admin routes only.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, audit_middleware))
}

/// Raw body, serialized as the JSON it contains (unit when empty).
struct CapturedBody(Bytes);

impl Serialize for CapturedBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            return serializer.serialize_unit();
        }
        let value: serde_json::Value =
            serde_json::from_slice(&self.0).map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}

struct CapturedResponse {
    parts: ResponseParts,
    body: CapturedBody,
}

impl Serialize for CapturedResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

struct FailedResponse {
    response: Response,
    message: String,
}

impl fmt::Display for FailedResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn failure_message(response: &Response) -> Option<String> {
    if let Some(FailureMessage(message)) = response.extensions().get::<FailureMessage>() {
        return Some(message.clone());
    }

    let status = response.status();
    (status.is_client_error() || status.is_server_error())
        .then(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

/// Response for an admin request whose body could not be buffered.
fn unreadable_body(err: &axum::Error) -> Response {
    if is_length_limit(err) {
        return StatusCode::PAYLOAD_TOO_LARGE.into_response();
    }
    AppError::bad_request("INVALID_BODY", "request body could not be read").into_response()
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}

async fn audit_middleware(
    State(state): State<AppState>,
    OriginalUri(original_uri): OriginalUri,
    req: Request<Body>,
    next: Next,
) -> Response {
    let actor = req.extensions().get::<AuthCtx>().map(|ctx| ctx.user_id);
    let method = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| original_uri.path().to_string());
    let route = format!("{} {}", req.method(), original_uri.path());

    let (parts, body) = req.into_parts();
    let (request_payload, buffered) = match to_bytes(body, AUDIT_BODY_LIMIT).await {
        Ok(bytes) => (
            render_payload(&CapturedBody(bytes.clone())),
            Ok(Request::from_parts(parts, Body::from(bytes))),
        ),
        Err(err) => {
            tracing::warn!(error = %err, route = %route, "failed to buffer admin request body");
            (
                UNRENDERABLE_PAYLOAD.to_string(),
                Err(FailedResponse {
                    response: unreadable_body(&err),
                    message: format!("request body could not be read: {err}"),
                }),
            )
        }
    };

    let call = AuditedCall {
        actor,
        method,
        route,
        request_payload,
    };

    let outcome = state
        .audit
        .intercept(call, || async move {
            let req = match buffered {
                Ok(req) => req,
                Err(failed) => return Err(failed),
            };
            let response = next.run(req).await;
            if let Some(message) = failure_message(&response) {
                return Err(FailedResponse { response, message });
            }

            let (parts, body) = response.into_parts();
            match to_bytes(body, usize::MAX).await {
                Ok(bytes) => Ok(CapturedResponse {
                    parts,
                    body: CapturedBody(bytes),
                }),
                Err(err) => Err(FailedResponse {
                    response: AppError::Internal.into_response(),
                    message: format!("response body could not be read: {err}"),
                }),
            }
        })
        .await;

    match outcome {
        Ok(captured) => Response::from_parts(captured.parts, Body::from(captured.body.0)),
        Err(failed) => failed.response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_body_renders_json_and_rejects_other_bytes() {
        assert_eq!(render_payload(&CapturedBody(Bytes::new())), "");
        assert_eq!(
            render_payload(&CapturedBody(Bytes::from_static(br#"{"role":"ADMIN"}"#))),
            "{\n  \"role\": \"ADMIN\"\n}"
        );
        assert_eq!(
            render_payload(&CapturedBody(Bytes::from_static(b"role=ADMIN"))),
            crate::services::audit::UNRENDERABLE_PAYLOAD
        );
    }

    #[test]
    fn app_error_responses_are_failures() {
        let response = AppError::not_found("user").into_response();
        assert_eq!(
            failure_message(&response).as_deref(),
            Some("not found: user")
        );
    }

    #[test]
    fn bare_error_status_is_a_failure_and_success_is_not() {
        let response = StatusCode::UNPROCESSABLE_ENTITY.into_response();
        assert_eq!(
            failure_message(&response).as_deref(),
            Some("Unprocessable Entity")
        );
        assert!(failure_message(&StatusCode::OK.into_response()).is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let err = to_bytes(Body::from("0123456789"), 4).await.unwrap_err();
        assert!(is_length_limit(&err));

        let response = unreadable_body(&err);
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(failure_message(&response).is_some());
    }
}
