//! Transport trait and implementations for executing GraphQL requests.
//!
//! The primary implementation is [`http::HttpTransport`], which posts to the
//! Wiki.js `/graphql` endpoint with a bearer token.
//!
//! # Testing
//!
//! Use [`MockTransport`] for testing without network access:
//!
//! ```
//! use wikijs::transport::{MockTransport, Transport};
//! use wikijs::GraphqlRequest;
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.reply("GetSite", json!({ "site": { "config": { "host": "https://wiki" } } }));
//!
//! let request = GraphqlRequest {
//!     query: "query GetSite { site { config { host } } }".to_string(),
//!     variables: json!({}),
//!     operation_name: "GetSite".to_string(),
//! };
//! let data = mock.execute(&request).unwrap();
//! assert_eq!(data["site"]["config"]["host"], "https://wiki");
//! assert_eq!(mock.request_count(), 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::operation::GraphqlRequest;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Executes one GraphQL request and returns its `data` member.
///
/// Implementations must surface GraphQL errors as [`Error::Graphql`] with the
/// server messages unmodified, and must not retry.
pub trait Transport: Send + Sync {
    /// Send a request; a single attempt.
    fn execute(&self, request: &GraphqlRequest) -> Result<Value>;
}

/// A canned reply for [`MockTransport`].
#[derive(Debug)]
enum MockReply {
    Data(Value),
    Errors(Vec<String>),
    Fail(Error),
}

/// Mock transport for testing without network access.
///
/// Replies are queued per operation name and consumed in order; the last
/// reply for an operation is kept and repeated. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<String, VecDeque<MockReply>>>>,
    requests: Arc<Mutex<Vec<GraphqlRequest>>>,
}

impl MockTransport {
    /// Create a new empty mock transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful `data` payload for an operation.
    pub fn reply(&self, operation: &str, data: Value) {
        self.push(operation, MockReply::Data(data));
    }

    /// Queue GraphQL errors for an operation.
    pub fn reply_errors(&self, operation: &str, messages: &[&str]) {
        let messages = messages.iter().map(ToString::to_string).collect();
        self.push(operation, MockReply::Errors(messages));
    }

    /// Queue a transport-level failure for an operation.
    pub fn fail(&self, operation: &str, error: Error) {
        self.push(operation, MockReply::Fail(error));
    }

    /// All recorded requests, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<GraphqlRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests for one operation.
    #[must_use]
    pub fn requests_for(&self, operation: &str) -> Vec<GraphqlRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.operation_name == operation)
            .collect()
    }

    /// Number of requests sent so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn push(&self, operation: &str, reply: MockReply) {
        let mut replies = self.replies.lock().unwrap();
        replies.entry(operation.to_string()).or_default().push_back(reply);
    }

    fn next_reply(&self, operation: &str) -> Option<MockReply> {
        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(operation)?;
        if queue.len() > 1 {
            return queue.pop_front();
        }
        // Keep the last reply around so repeated reads stay answerable.
        match queue.front()? {
            MockReply::Data(data) => Some(MockReply::Data(data.clone())),
            MockReply::Errors(messages) => Some(MockReply::Errors(messages.clone())),
            MockReply::Fail(_) => queue.pop_front(),
        }
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &GraphqlRequest) -> Result<Value> {
        self.requests.lock().unwrap().push(request.clone());

        match self.next_reply(&request.operation_name) {
            Some(MockReply::Data(data)) => Ok(data),
            Some(MockReply::Errors(messages)) => Err(Error::Graphql { messages }),
            Some(MockReply::Fail(error)) => Err(error),
            None => Err(Error::InvalidResponse(format!(
                "mock reply not configured: {}",
                request.operation_name
            ))),
        }
    }
}
