//! Typed GraphQL operations and the request/response envelopes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Whether an operation reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Read-only `query`.
    Query,
    /// State-changing `mutation`.
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

/// Typed GraphQL operation definition.
///
/// Implement this for each query or mutation. `DOCUMENT` must declare a named
/// operation matching `NAME`, and its variables must match the serialized
/// field names of `Variables`.
pub trait Operation {
    /// Variables sent alongside the document.
    type Variables: Serialize;
    /// Shape of the `data` member of the reply.
    type Response: DeserializeOwned;

    /// Operation name, sent as `operationName`.
    const NAME: &'static str;
    /// Query or mutation.
    const KIND: OperationKind;
    /// GraphQL document text.
    const DOCUMENT: &'static str;
}

/// Variables for operations that take none.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoVariables {}

/// GraphQL request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    /// Document text.
    pub query: String,
    /// Variables object.
    pub variables: Value,
    /// Named operation inside the document.
    pub operation_name: String,
}

impl GraphqlRequest {
    /// Build the request for a typed operation.
    pub fn for_operation<O: Operation>(variables: &O::Variables) -> serde_json::Result<Self> {
        Ok(Self {
            query: O::DOCUMENT.to_string(),
            variables: serde_json::to_value(variables)?,
            operation_name: O::NAME.to_string(),
        })
    }

    /// Look up a variable by name.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

/// GraphQL error entry, trimmed to what is reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
}

/// GraphQL response container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphqlResponse {
    /// Response data.
    #[serde(default)]
    pub data: Option<Value>,
    /// GraphQL errors.
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
    /// Returns `true` if no GraphQL errors were returned.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages, unmodified.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}
