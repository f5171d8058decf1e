//! # wikijs
//!
//! Typed, blocking client for the administrative GraphQL API of Wiki.js.
//!
//! This crate provides:
//! - A [`Client`] that probes the endpoint on connect and runs typed
//!   [`Operation`]s as single-attempt queries and mutations
//! - Wire types for site settings, groups, page rules and authentication
//!   strategies ([`schema`])
//! - Local validation of group and strategy configuration ([`validation`])
//! - Converters between host-side identities and GraphQL scalars ([`convert`])
//!
//! ## Example
//!
//! ```no_run
//! use wikijs::Client;
//!
//! let client = Client::connect("https://wiki.example.com/graphql", "api-token")
//!     .expect("connection failed");
//!
//! let site = client.site().unwrap();
//! println!("Connected to {} ({})", site.title, site.host);
//!
//! for group in client.groups().unwrap() {
//!     println!("{:>4} {} ({} users)", group.id, group.name, group.user_count);
//! }
//! ```
//!
//! ## Testing
//!
//! [`MockTransport`] answers operations by name without a network:
//!
//! ```
//! use wikijs::{Client, MockTransport};
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.reply("GetSite", json!({ "site": { "config": { "title": "Wiki" } } }));
//!
//! let client = Client::connect_with(Box::new(mock.clone())).unwrap();
//! assert_eq!(client.site().unwrap().title, "Wiki");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod convert;
pub mod error;
pub mod operation;
pub mod schema;
pub mod transport;
pub mod validation;

pub use error::{Error, ErrorCategory, Result};
pub use operation::{GraphqlRequest, GraphqlResponse, NoVariables, Operation, OperationKind};
pub use schema::{
    AuthenticationActiveStrategy, AuthenticationStrategy, Group, GroupSummary, GroupUpdate,
    PageRule, PageRuleMatch, PropertyType, SiteConfig, StrategyInput, StrategyProperty,
};
pub use transport::MockTransport;
pub use validation::{ValidationError, ValidationErrors};

use schema::authentication::{
    ActiveStrategiesVariables, GetActiveStrategies, GetStrategies, UpdateStrategies,
    UpdateStrategiesVariables,
};
use schema::group::{
    CreateGroup, CreateGroupVariables, DeleteGroup, GetGroup, IdVariables, ListGroups,
    UpdateGroup, UpdateGroupVariables,
};
use schema::site::GetSite;
use transport::Transport;
use transport::http::HttpTransport;

/// High-level client for the Wiki.js GraphQL API.
///
/// Every call is one synchronous request with no retry. The client is
/// `Send + Sync` and meant to be shared through an `Arc`.
pub struct Client {
    transport: Box<dyn Transport>,
}

impl Client {
    /// Connect to `host` (the `/graphql` endpoint URL) with a bearer token.
    ///
    /// Makes one probe query before returning. A forbidden probe fails with
    /// [`Error::Authentication`]; any other failure is returned as is.
    pub fn connect(host: &str, token: &str) -> Result<Self> {
        Self::connect_with(Box::new(HttpTransport::new(host, token)))
    }

    /// Connect over a custom transport, probing it first.
    pub fn connect_with(transport: Box<dyn Transport>) -> Result<Self> {
        let client = Self::with_transport(transport);
        match client.site() {
            Ok(_) => Ok(client),
            Err(err) if err.is_forbidden() => Err(Error::Authentication(
                "check that the host and API token are correct".to_string(),
            )),
            Err(err) => Err(err),
        }
    }

    /// Create a client over a custom transport without probing (useful for testing).
    #[must_use]
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    // =========================================================================
    // Generic Operations
    // =========================================================================

    /// Run a query operation.
    pub fn query<O: Operation>(&self, variables: &O::Variables) -> Result<O::Response> {
        if O::KIND != OperationKind::Query {
            return Err(Error::Other(format!("{} is not a query", O::NAME)));
        }
        self.execute::<O>(variables)
    }

    /// Run a mutation operation.
    pub fn mutate<O: Operation>(&self, variables: &O::Variables) -> Result<O::Response> {
        if O::KIND != OperationKind::Mutation {
            return Err(Error::Other(format!("{} is not a mutation", O::NAME)));
        }
        self.execute::<O>(variables)
    }

    fn execute<O: Operation>(&self, variables: &O::Variables) -> Result<O::Response> {
        log::debug!("{} {}", O::KIND, O::NAME);
        let request = GraphqlRequest::for_operation::<O>(variables)?;
        let data = self.transport.execute(&request)?;
        Ok(serde_json::from_value(data)?)
    }

    // =========================================================================
    // Site
    // =========================================================================

    /// Get the public site settings.
    pub fn site(&self) -> Result<SiteConfig> {
        Ok(self.query::<GetSite>(&NoVariables {})?.site.config)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// Get a group by id.
    ///
    /// Returns `None` when Wiki.js answers with a null or empty record.
    pub fn group(&self, id: i32) -> Result<Option<Group>> {
        let data = self.query::<GetGroup>(&IdVariables { id })?;
        Ok(data.groups.single.filter(|group| !group.is_empty()))
    }

    /// List all groups.
    pub fn groups(&self) -> Result<Vec<GroupSummary>> {
        Ok(self.query::<ListGroups>(&NoVariables {})?.groups.list)
    }

    /// Create a group with default settings.
    pub fn create_group(&self, name: &str) -> Result<Group> {
        let payload = self
            .mutate::<CreateGroup>(&CreateGroupVariables {
                name: name.to_string(),
            })?
            .groups
            .create;
        payload.response_result.into_result()?;
        payload
            .group
            .ok_or_else(|| Error::InvalidResponse("create returned no group".to_string()))
    }

    /// Replace a group's configuration.
    ///
    /// Validation runs first; an invalid update sends nothing.
    pub fn update_group(&self, update: &GroupUpdate) -> Result<()> {
        validation::validate_group_update(update)?;
        self.mutate::<UpdateGroup>(&UpdateGroupVariables::from(update))?
            .groups
            .update
            .response_result
            .into_result()
    }

    /// Delete a group.
    pub fn delete_group(&self, id: i32) -> Result<()> {
        self.mutate::<DeleteGroup>(&IdVariables { id })?
            .groups
            .delete
            .response_result
            .into_result()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// List the strategy module catalog.
    pub fn strategies(&self) -> Result<Vec<AuthenticationStrategy>> {
        Ok(self
            .query::<GetStrategies>(&NoVariables {})?
            .authentication
            .strategies)
    }

    /// List configured strategy instances.
    pub fn active_strategies(&self, enabled_only: bool) -> Result<Vec<AuthenticationActiveStrategy>> {
        Ok(self
            .query::<GetActiveStrategies>(&ActiveStrategiesVariables { enabled_only })?
            .authentication
            .active_strategies)
    }

    /// Replace the whole list of configured strategy instances.
    pub fn update_strategies(&self, strategies: Vec<StrategyInput>) -> Result<()> {
        self.mutate::<UpdateStrategies>(&UpdateStrategiesVariables { strategies })?
            .authentication
            .update_strategies
            .response_result
            .into_result()
    }
}
