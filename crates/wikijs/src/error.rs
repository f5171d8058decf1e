//! Error types for Wiki.js API operations.
//!
//! Every failure is fatal and surfaced verbatim: the client performs a single
//! attempt per call and never retries. Categories exist for user feedback only.

use crate::validation::ValidationErrors;
use std::fmt;

/// Result type alias for Wiki.js operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Wiki.js errors for user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed provider configuration.
    Configuration,
    /// The API rejected the token.
    Authentication,
    /// Network failure, timeout, or unexpected HTTP status.
    Connectivity,
    /// Desired state rejected locally before any request.
    Validation,
    /// The API processed the request and reported a failure.
    Remote,
    /// Undecodable response payload.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Whether this error was raised before any request left the process.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Configuration | Self::Validation)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Configuration => "Provider configuration incomplete",
            Self::Authentication => "Authentication rejected",
            Self::Connectivity => "Could not reach the Wiki.js API",
            Self::Validation => "Desired state is invalid",
            Self::Remote => "Wiki.js reported an error",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Configuration => {
                "Set WIKIJS_HOST and WIKIJS_TOKEN, pass --host/--token, or fill the [provider] block"
            }
            Self::Authentication => "Check that the host and API token are correct",
            Self::Connectivity => "Check that the host is reachable and points at the /graphql endpoint",
            Self::Validation => "Fix the reported fields in the desired-state file",
            Self::Remote => "Inspect the message returned by Wiki.js",
            Self::Format => "The server may be running an unsupported Wiki.js version",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Wiki.js.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required provider setting is missing.
    #[error("Wiki.js {field} not declared: {hint}")]
    Configuration {
        /// Missing setting name.
        field: &'static str,
        /// Where the setting can be supplied.
        hint: String,
    },

    /// The API rejected the bearer token.
    #[error("failed to login to Wiki.js API: {0}")]
    Authentication(String),

    /// Network failure, timeout, or non-success HTTP status.
    #[error("Wiki.js request failed: {message}")]
    Connectivity {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// GraphQL errors returned by the server, unmodified.
    #[error("GraphQL error: {}", .messages.join("; "))]
    Graphql {
        /// Server-provided messages.
        messages: Vec<String>,
    },

    /// A mutation answered with `responseResult.succeeded == false`.
    #[error("Wiki.js rejected the request ({slug}): {message}")]
    Remote {
        /// Error slug reported by Wiki.js.
        slug: String,
        /// Message reported by Wiki.js.
        message: String,
        /// Numeric error code reported by Wiki.js.
        code: i32,
    },

    /// Desired state failed local validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The response could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// A state id is not an integer.
    #[error("invalid resource id \"{0}\": expected an integer")]
    InvalidId(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a connectivity error.
    pub fn connectivity(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Connectivity {
            message: message.into(),
            status,
        }
    }

    /// Create a configuration error for a missing setting.
    pub fn missing(field: &'static str, env_var: &str, attribute: &str) -> Self {
        Self::Configuration {
            field,
            hint: format!(
                "set the value as an env var {env_var} or as `{attribute}` in the provider block"
            ),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration { .. } => ErrorCategory::Configuration,
            Error::Authentication(_) => ErrorCategory::Authentication,
            Error::Connectivity { .. } => ErrorCategory::Connectivity,
            Error::Graphql { .. } | Error::Remote { .. } => ErrorCategory::Remote,
            Error::Validation(_) | Error::InvalidId(_) => ErrorCategory::Validation,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::Other(_) => ErrorCategory::Other,
        }
    }

    /// Whether the server refused the request as forbidden.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        match self {
            Error::Graphql { messages } => messages.iter().any(|m| m.contains("Forbidden")),
            Error::Connectivity { status, .. } => matches!(status, Some(401 | 403)),
            _ => false,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Connectivity {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            ureq::Error::Timeout(timeout) => Self::Connectivity {
                message: format!("timed out ({timeout:?})"),
                status: None,
            },
            other => Self::Connectivity {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
