//! Admin API audit trail.
//!
//! `AdminAudit::intercept` wraps one administrative call: it writes a
//! request-phase line, runs the call, then writes exactly one response-phase
//! or error-phase line. Failures of the wrapped call are returned untouched.
//! Payloads that cannot be rendered degrade to a placeholder and never affect
//! the call.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info};

/// Substituted for any payload that could not be rendered.
pub const UNRENDERABLE_PAYLOAD: &str = "<unserializable payload>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditPhase {
    Request,
    Response,
    Error,
}

impl AuditPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditPhase::Request => "request",
            AuditPhase::Response => "response",
            AuditPhase::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLine {
    pub phase: AuditPhase,
    pub actor: Option<i64>,
    pub at: DateTime<Utc>,
    pub method: String,
    pub route: String,
    // Rendered payload for request/response phases, failure message for the error phase.
    pub payload: String,
}

/// Append-only destination for audit lines. Writes are fire-and-forget.
pub trait AuditSink: Send + Sync {
    fn write(&self, line: AuditLine);
}

/// Writes audit lines as structured `tracing` events on target `admin_audit`.
#[derive(Debug, Clone, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn write(&self, line: AuditLine) {
        let actor = line
            .actor
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let at = line.at.to_rfc3339();

        match line.phase {
            AuditPhase::Error => error!(
                target: "admin_audit",
                phase = line.phase.as_str(),
                actor = %actor,
                at = %at,
                method = %line.method,
                route = %line.route,
                message = %line.payload,
                "admin api failed"
            ),
            phase => info!(
                target: "admin_audit",
                phase = phase.as_str(),
                actor = %actor,
                at = %at,
                method = %line.method,
                route = %line.route,
                payload = %line.payload,
                "admin api"
            ),
        }
    }
}

/// Keeps lines in memory; for tests and local inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    lines: Mutex<Vec<AuditLine>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<AuditLine> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn write(&self, line: AuditLine) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line);
    }
}

#[derive(Debug, Error)]
#[error("audit payload could not be rendered: {0}")]
pub struct AuditSerializationError(#[from] serde_json::Error);

/// Who called what, resolved before the wrapped call runs.
#[derive(Debug, Clone)]
pub struct AuditedCall {
    pub actor: Option<i64>,
    // Handler identifier, e.g. the matched route template.
    pub method: String,
    // Human-readable route, e.g. `PATCH /api/v1/admin/users/1`.
    pub route: String,
    pub request_payload: String,
}

#[derive(Clone)]
pub struct AdminAudit {
    sink: Arc<dyn AuditSink>,
}

impl fmt::Debug for AdminAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAudit").finish_non_exhaustive()
    }
}

impl AdminAudit {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub async fn intercept<T, E, F, Fut>(&self, call: AuditedCall, proceed: F) -> Result<T, E>
    where
        T: Serialize,
        E: fmt::Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.write(&call, AuditPhase::Request, call.request_payload.clone());

        match proceed().await {
            Ok(value) => {
                let payload = render_response(&value);
                self.write(&call, AuditPhase::Response, payload);
                Ok(value)
            }
            Err(err) => {
                self.write(&call, AuditPhase::Error, err.to_string());
                Err(err)
            }
        }
    }

    fn write(&self, call: &AuditedCall, phase: AuditPhase, payload: String) {
        self.sink.write(AuditLine {
            phase,
            actor: call.actor,
            at: Utc::now(),
            method: call.method.clone(),
            route: call.route.clone(),
            payload,
        });
    }
}

/// Render a request payload as pretty JSON (`""` for nothing).
pub fn render_payload<T: Serialize + ?Sized>(payload: &T) -> String {
    let rendered = serde_json::to_value(payload)
        .map_err(AuditSerializationError::from)
        .and_then(|value| pretty(&value));
    degrade(rendered)
}

/// Like `render_payload`, but logs only the inner `body` of a status/body envelope.
pub fn render_response<T: Serialize + ?Sized>(response: &T) -> String {
    let rendered = serde_json::to_value(response)
        .map_err(AuditSerializationError::from)
        .and_then(|value| pretty(envelope_body(&value)));
    degrade(rendered)
}

/// The payload of a `{"status": .., "body": ..}` envelope, or the value itself.
pub fn envelope_body(value: &Value) -> &Value {
    match value {
        Value::Object(map) if map.contains_key("status") && map.contains_key("body") => {
            &map["body"]
        }
        other => other,
    }
}

fn pretty(value: &Value) -> Result<String, AuditSerializationError> {
    if value.is_null() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string_pretty(value)?)
}

fn degrade(rendered: Result<String, AuditSerializationError>) -> String {
    rendered.unwrap_or_else(|err| {
        error!(target: "admin_audit", error = %err, "audit serialization failure");
        UNRENDERABLE_PAYLOAD.to_string()
    })
}

#[cfg(test)]
mod tests {
    use serde::Serializer;
    use serde_json::json;

    use super::*;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refusing to serialize"))
        }
    }

    fn call(actor: Option<i64>) -> AuditedCall {
        AuditedCall {
            actor,
            method: "/api/v1/admin/users/{user_id}".to_string(),
            route: "PATCH /api/v1/admin/users/1".to_string(),
            request_payload: render_payload(&json!({ "role": "ADMIN" })),
        }
    }

    fn audit() -> (AdminAudit, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        (AdminAudit::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn success_writes_request_then_response_with_envelope_body() {
        let (audit, sink) = audit();

        let result: Result<Value, String> = audit
            .intercept(call(Some(1)), || async {
                Ok(json!({ "status": 200, "body": { "id": 1, "role": "ADMIN" } }))
            })
            .await;
        assert!(result.is_ok());

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].phase, AuditPhase::Request);
        assert_eq!(lines[1].phase, AuditPhase::Response);
        assert!(lines.iter().all(|l| l.actor == Some(1)));
        assert!(lines[0].payload.contains("\"role\": \"ADMIN\""));

        let logged: Value = serde_json::from_str(&lines[1].payload).unwrap();
        assert_eq!(logged, json!({ "id": 1, "role": "ADMIN" }));
        assert!(lines[0].at <= lines[1].at);
    }

    #[tokio::test]
    async fn plain_response_is_logged_whole() {
        let (audit, sink) = audit();

        let _: Result<Value, String> = audit
            .intercept(call(Some(1)), || async { Ok(json!([{ "id": 1 }, { "id": 2 }])) })
            .await;

        let logged: Value = serde_json::from_str(&sink.lines()[1].payload).unwrap();
        assert_eq!(logged, json!([{ "id": 1 }, { "id": 2 }]));
    }

    #[tokio::test]
    async fn failure_writes_request_and_error_lines_and_returns_error_unchanged() {
        let (audit, sink) = audit();

        let result: Result<Value, String> = audit
            .intercept(call(Some(1)), || async { Err("user not found".to_string()) })
            .await;
        assert_eq!(result.unwrap_err(), "user not found");

        let lines = sink.lines();
        let phases: Vec<AuditPhase> = lines.iter().map(|l| l.phase).collect();
        assert_eq!(phases, vec![AuditPhase::Request, AuditPhase::Error]);
        assert_eq!(lines[1].payload, "user not found");
        assert_eq!(lines[1].route, "PATCH /api/v1/admin/users/1");
    }

    #[tokio::test]
    async fn missing_actor_does_not_fail_the_call() {
        let (audit, sink) = audit();

        let result: Result<u8, String> = audit.intercept(call(None), || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert!(sink.lines().iter().all(|l| l.actor.is_none()));
    }

    #[tokio::test]
    async fn unserializable_response_degrades_to_placeholder() {
        let (audit, sink) = audit();

        let result: Result<Unserializable, String> = audit
            .intercept(call(Some(1)), || async { Ok(Unserializable) })
            .await;
        assert!(result.is_ok());
        assert_eq!(sink.lines()[1].payload, UNRENDERABLE_PAYLOAD);
    }

    #[test]
    fn render_payload_handles_null_and_failures() {
        assert_eq!(render_payload(&()), "");
        assert_eq!(render_payload(&Unserializable), UNRENDERABLE_PAYLOAD);
    }

    #[test]
    fn envelope_detection_requires_status_and_body() {
        let envelope = json!({ "status": 200, "body": { "a": 1 } });
        assert_eq!(envelope_body(&envelope), &json!({ "a": 1 }));

        let not_envelope = json!({ "body": { "a": 1 } });
        assert_eq!(envelope_body(&not_envelope), &not_envelope);
    }
}
