//! HTTP handlers for the queue
//!
//! Every route answers with HTTP 200 and a JSON body whose `error` field is
//! the only outcome signal. Request bodies may be JSON or form encoded.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use wonderq_core::{ErrorCode, MessageId, WireError};

use crate::storage::{LeasedMessage, QueueStore};

/// Queue routes, to be mounted by the server with a shared store as state
pub fn routes() -> Router<Arc<QueueStore>> {
    Router::new()
        .route("/new-message", get(handle_new_message))
        .route("/create-message", post(handle_create_message))
        .route("/update-message", post(handle_update_message))
}

// === Response types ===

#[derive(Debug, Serialize)]
struct NewMessageResponse {
    error: ErrorCode,
    message: LeasedMessage,
}

#[derive(Debug, Serialize)]
struct CreateMessageResponse {
    error: ErrorCode,
    id: MessageId,
}

// === Handlers ===

pub async fn handle_new_message(State(store): State<Arc<QueueStore>>) -> Response {
    match store.lease_next() {
        Ok(message) => json_response(&NewMessageResponse {
            error: ErrorCode::Ok,
            message,
        }),
        Err(_) => code_response(ErrorCode::Rejected),
    }
}

pub async fn handle_create_message(
    State(store): State<Arc<QueueStore>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let fields = match parse_fields(&headers, &body) {
        Ok(fields) => fields,
        Err(e) => {
            warn!(error = %e, "Malformed create-message body");
            return code_response(ErrorCode::Rejected);
        }
    };

    let Some(message) = fields.get("message").and_then(Value::as_str) else {
        warn!("create-message without a text `message` field");
        return code_response(ErrorCode::Rejected);
    };

    match store.enqueue(message) {
        Ok(id) => json_response(&CreateMessageResponse {
            error: ErrorCode::Ok,
            id,
        }),
        Err(e) => {
            warn!(error = %e, "Rejected message");
            code_response(ErrorCode::Rejected)
        }
    }
}

pub async fn handle_update_message(
    State(store): State<Arc<QueueStore>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let fields = match parse_fields(&headers, &body) {
        Ok(fields) => fields,
        Err(e) => {
            warn!(error = %e, "Malformed update-message body");
            return code_response(ErrorCode::Rejected);
        }
    };

    let id = fields.get("id").and_then(Value::as_str).unwrap_or_default();
    let status = fields.get("status").and_then(status_code);

    match store.update(id, status) {
        Ok(applied) => {
            info!(id = %id, status = applied.code(), "Updated message");
            code_response(ErrorCode::Ok)
        }
        Err(e) => {
            warn!(id = %id, error = %e, "Update rejected");
            code_response(e.error_code())
        }
    }
}

// === Request parsing ===

/// Decode a JSON object or form body into a field map.
///
/// Bodies with any other content type are treated as empty.
fn parse_fields(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, serde_json::Error> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.contains("json") {
        if body.is_empty() {
            return Ok(Map::new());
        }
        return match serde_json::from_slice::<Value>(body)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        };
    }

    if content_type.starts_with("application/x-www-form-urlencoded") {
        return Ok(form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
            .collect());
    }

    Ok(Map::new())
}

/// Integral status from a JSON number.
///
/// `1.0` counts as `1`. Strings never do, so a form-encoded `status=1` is
/// an unrecognized status.
fn status_code(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

// === JSON Helpers ===

fn json_response<T: Serialize>(body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => with_json_content_type(json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize response");
            code_response(ErrorCode::Rejected)
        }
    }
}

fn code_response(code: ErrorCode) -> Response {
    with_json_content_type(WireError::new(code).to_json())
}

fn with_json_content_type(json: String) -> Response {
    let mut response = Response::new(Body::from(json));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, content_type.parse().unwrap());
        headers
    }

    #[test]
    fn test_parse_json_fields() {
        let fields = parse_fields(
            &headers("application/json"),
            br#"{"id":"abc","status":2}"#,
        )
        .unwrap();
        assert_eq!(fields.get("id"), Some(&json!("abc")));
        assert_eq!(fields.get("status").and_then(status_code), Some(2));
    }

    #[test]
    fn test_parse_form_fields() {
        let fields = parse_fields(
            &headers("application/x-www-form-urlencoded; charset=utf-8"),
            b"message=hello+world&status=1",
        )
        .unwrap();
        assert_eq!(fields.get("message"), Some(&json!("hello world")));
        assert_eq!(fields.get("status"), Some(&json!("1")));
        assert_eq!(fields.get("status").and_then(status_code), None);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_fields(&headers("application/json"), b"{not json").is_err());
    }

    #[test]
    fn test_unknown_content_type_is_empty() {
        let fields = parse_fields(&headers("text/plain"), b"message=hi").unwrap();
        assert!(fields.is_empty());
        assert!(parse_fields(&HeaderMap::new(), b"").unwrap().is_empty());
    }

    #[test]
    fn test_status_code_values() {
        assert_eq!(status_code(&json!(1)), Some(1));
        assert_eq!(status_code(&json!(2)), Some(2));
        assert_eq!(status_code(&json!(1.0)), Some(1));
        assert_eq!(status_code(&json!(2.0)), Some(2));
        assert_eq!(status_code(&json!(1.5)), None);
        assert_eq!(status_code(&json!(1e300)), None);
        assert_eq!(status_code(&json!(null)), None);
        assert_eq!(status_code(&json!(true)), None);
    }

    #[test]
    fn test_string_status_is_never_recognized() {
        for raw in ["1", "2", " 2 ", "1.0", "two"] {
            assert_eq!(status_code(&json!(raw)), None, "status {:?}", raw);
        }
    }
}
