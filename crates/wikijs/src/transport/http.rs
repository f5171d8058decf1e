//! HTTP transport for the Wiki.js GraphQL endpoint.
//!
//! One [`ureq::Agent`] is shared by every call. The agent's connection pool is
//! safe for concurrent use, so a single transport can serve parallel resource
//! operations.

use crate::error::{Error, Result};
use crate::operation::{GraphqlRequest, GraphqlResponse};
use crate::transport::Transport;
use serde_json::Value;
use std::time::Duration;

/// Fixed per-request timeout. Expiry is fatal; there is no retry.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum response size accepted from the API.
const MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

/// Bearer-authenticated GraphQL transport.
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// GraphQL endpoint URL.
    endpoint: String,
    /// Pre-rendered `Authorization` header value.
    authorization: String,
}

impl HttpTransport {
    /// Create a transport for `endpoint` authenticating with `token`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, token: &str) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            endpoint: endpoint.into(),
            authorization: format!("Bearer {token}"),
        }
    }

    /// Get the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token stays out of debug output.
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &GraphqlRequest) -> Result<Value> {
        log::debug!("POST {} ({})", self.endpoint, request.operation_name);

        let mut response = self
            .agent
            .post(&self.endpoint)
            .header("Authorization", self.authorization.as_str())
            .header("Accept", "application/json")
            .header("User-Agent", concat!("wikijs-rs/", env!("CARGO_PKG_VERSION")))
            .send_json(request)?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_SIZE)
            .read_to_string()?;

        decode_body(status, &body)
    }
}

/// Turn a raw HTTP reply into the `data` member or an error.
///
/// GraphQL servers may answer errors with a non-2xx status and a valid
/// envelope, so the envelope is tried before the status is judged.
fn decode_body(status: u16, body: &str) -> Result<Value> {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<GraphqlResponse>(body) {
        Ok(envelope) if !envelope.is_ok() => Err(Error::Graphql {
            messages: envelope.messages(),
        }),
        Ok(envelope) if success => envelope
            .data
            .ok_or_else(|| Error::InvalidResponse("response carried no data".to_string())),
        Err(err) if success => Err(Error::InvalidResponse(err.to_string())),
        _ => Err(Error::connectivity(
            format!("HTTP {status}: {}", truncate(body, 200)),
            Some(status),
        )),
    }
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_transport() {
        let transport = HttpTransport::new("https://wiki.example.com/graphql", "secret");
        assert_eq!(transport.endpoint(), "https://wiki.example.com/graphql");
        assert_eq!(transport.authorization, "Bearer secret");
    }

    #[test]
    fn test_debug_hides_token() {
        let transport = HttpTransport::new("https://wiki.example.com/graphql", "secret");
        let debug = format!("{transport:?}");
        assert!(debug.contains("wiki.example.com"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_decode_success() {
        let body = json!({ "data": { "site": { "config": { "title": "Wiki" } } } }).to_string();
        let data = decode_body(200, &body).unwrap();
        assert_eq!(data["site"]["config"]["title"], "Wiki");
    }

    #[test]
    fn test_decode_graphql_errors_on_ok_status() {
        let body = json!({ "data": null, "errors": [{ "message": "Forbidden" }] }).to_string();
        let err = decode_body(200, &body).unwrap_err();
        assert!(matches!(err, Error::Graphql { .. }));
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_decode_graphql_errors_on_error_status() {
        let body = json!({ "errors": [{ "message": "Variable \"$id\" got invalid value" }] })
            .to_string();
        match decode_body(400, &body).unwrap_err() {
            Error::Graphql { messages } => {
                assert_eq!(messages, vec!["Variable \"$id\" got invalid value"]);
            }
            other => panic!("Expected Error::Graphql, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_http_status_without_envelope() {
        match decode_body(403, "<html>Forbidden</html>").unwrap_err() {
            Error::Connectivity { status, .. } => assert_eq!(status, Some(403)),
            other => panic!("Expected Error::Connectivity, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_data() {
        assert!(matches!(
            decode_body(200, "{}"),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_decode_garbage_body() {
        assert!(matches!(
            decode_body(200, "not json"),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
    }
}
