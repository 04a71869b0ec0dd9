//! Shared HTTP client and response helpers.

use std::sync::OnceLock;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};

use crate::error::TransportError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
///
/// Per-request deadlines are applied by the callers; the client itself only
/// carries connection pooling.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            })
    })
}

/// JSON headers, plus a bearer token when one is configured.
pub fn json_headers(api_key: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
        if let Ok(val) = HeaderValue::from_str(&format!("Bearer {key}")) {
            headers.insert(AUTHORIZATION, val);
        }
    }
    headers
}

/// Map a non-success status to a typed failure, keeping a bounded body excerpt for logs.
pub fn status_to_error(status: u16, body: &str) -> TransportError {
    const MAX_BODY: usize = 512;
    let body = match body.char_indices().nth(MAX_BODY) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    };
    TransportError::Status { status, body }
}

/// Extract a backend-reported error from a JSON body, if any.
pub fn error_field(value: &serde_json::Value) -> Option<String> {
    match value.get("error")? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => Some(
            obj.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| serde_json::Value::Object(obj.clone()).to_string()),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bearer_header_only_when_key_present() {
        assert!(json_headers(None).get(AUTHORIZATION).is_none());
        assert!(json_headers(Some("  ")).get(AUTHORIZATION).is_none());
        let headers = json_headers(Some("k"));
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer k");
    }

    #[test]
    fn error_field_reads_strings_and_objects() {
        assert_eq!(error_field(&json!({"error": "boom"})).as_deref(), Some("boom"));
        assert_eq!(
            error_field(&json!({"error": {"message": "nested"}})).as_deref(),
            Some("nested")
        );
        assert_eq!(error_field(&json!({"error": null})), None);
        assert_eq!(error_field(&json!({"response": "ok"})), None);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        match status_to_error(500, &body) {
            TransportError::Status { status, body } => {
                assert_eq!(status, 500);
                assert!(body.chars().count() <= 513);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
