//! Shapes shared by several operations.

use crate::convert::null_as_default;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome reported by every Wiki.js mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStatus {
    /// Whether the mutation took effect.
    pub succeeded: bool,
    /// Numeric error code, 0 on success.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_code: i32,
    /// Short machine-readable outcome.
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    /// Human-readable outcome.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

impl ResponseStatus {
    /// Convert a failed status into [`Error::Remote`].
    pub fn into_result(self) -> Result<()> {
        if self.succeeded {
            Ok(())
        } else {
            Err(Error::Remote {
                slug: self.slug,
                message: self.message,
                code: self.error_code,
            })
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "succeeded={} code={} slug={} message={}",
            self.succeeded, self.error_code, self.slug, self.message
        )
    }
}

/// Mutation payload carrying only a status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultResponse {
    /// Mutation outcome.
    pub response_result: ResponseStatus,
}

/// Generic key/value pair; `value` is usually JSON-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    /// Key.
    pub key: String,
    /// Raw value.
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_status_success() {
        let status: ResponseStatus = serde_json::from_value(json!({
            "succeeded": true, "errorCode": 0, "slug": "ok", "message": null
        }))
        .unwrap();
        assert!(status.into_result().is_ok());
    }

    #[test]
    fn test_response_status_failure_keeps_message() {
        let status: ResponseStatus = serde_json::from_value(json!({
            "succeeded": false,
            "errorCode": 1001,
            "slug": "AuthGenericError",
            "message": "Cannot delete system group."
        }))
        .unwrap();
        match status.into_result().unwrap_err() {
            Error::Remote {
                slug,
                message,
                code,
            } => {
                assert_eq!(slug, "AuthGenericError");
                assert_eq!(message, "Cannot delete system group.");
                assert_eq!(code, 1001);
            }
            other => panic!("Expected Error::Remote, got {other:?}"),
        }
    }

    #[test]
    fn test_response_status_display() {
        let status = ResponseStatus {
            succeeded: true,
            error_code: 0,
            slug: "ok".to_string(),
            message: "Group updated".to_string(),
        };
        assert!(status.to_string().contains("Group updated"));
    }
}
