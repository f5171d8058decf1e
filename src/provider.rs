//! Provider registration: settings, the shared client, and the resource and
//! data source types built on it.

use declarative::ExecutionPlan;
use std::sync::Arc;
use wikijs::{Client, Error, Result};

use crate::config::{DesiredState, ProviderBlock};
use crate::datasource::{SiteDataSource, StrategyCatalog};
use crate::resource::authentication::AUTHENTICATION_TYPE;
use crate::resource::group::GROUP_TYPE;
use crate::resource::{
    AuthenticationReconciler, AuthenticationResource, GroupReconciler, GroupResource,
};

pub const HOST_ENV: &str = "WIKIJS_HOST";
pub const TOKEN_ENV: &str = "WIKIJS_TOKEN";

/// Resource types this provider manages
pub const RESOURCE_TYPES: &[&str] = &[GROUP_TYPE, AUTHENTICATION_TYPE];

/// Resolved connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub host: String,
    pub token: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl ProviderConfig {
    /// Resolve host and token: flags, then the `[provider]` block, then `env`.
    ///
    /// Empty values count as missing.
    pub fn resolve<F>(flags: &ProviderBlock, block: &ProviderBlock, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |flag: &Option<String>, file: &Option<String>, var: &str| {
            flag.clone()
                .filter(|v| !v.is_empty())
                .or_else(|| file.clone().filter(|v| !v.is_empty()))
                .or_else(|| env(var).filter(|v| !v.is_empty()))
        };

        let host = pick(&flags.host, &block.host, HOST_ENV)
            .ok_or_else(|| Error::missing("HOST", HOST_ENV, "host"))?;
        let token = pick(&flags.token, &block.token, TOKEN_ENV)
            .ok_or_else(|| Error::missing("TOKEN", TOKEN_ENV, "token"))?;

        Ok(Self { host, token })
    }

    /// [`Self::resolve`] against the process environment
    pub fn from_env(flags: &ProviderBlock, block: &ProviderBlock) -> Result<Self> {
        Self::resolve(flags, block, |name| std::env::var(name).ok())
    }
}

/// Configured provider holding the one client shared by every resource
pub struct Provider {
    client: Arc<Client>,
}

impl Provider {
    /// Connect and probe the API
    pub fn configure(config: &ProviderConfig) -> Result<Self> {
        log::debug!("Connecting to {}", config.host);
        Ok(Self::with_client(Client::connect(&config.host, &config.token)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn groups(&self) -> GroupReconciler {
        GroupReconciler::new(Arc::clone(&self.client))
    }

    pub fn authentications(&self) -> AuthenticationReconciler {
        AuthenticationReconciler::new(Arc::clone(&self.client))
    }

    pub fn site(&self) -> SiteDataSource {
        SiteDataSource::new(Arc::clone(&self.client))
    }

    pub fn strategy_catalog(&self) -> StrategyCatalog {
        StrategyCatalog::new(Arc::clone(&self.client))
    }

    /// One resource per desired group and authentication bundle.
    ///
    /// Groups go first so auto-enroll checks see groups created in the
    /// same run.
    pub fn plan(&self, state: &DesiredState) -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        for group in &state.groups {
            plan.add_resource(Box::new(GroupResource::new(self.groups(), group)));
        }
        for auth in &state.authentications {
            plan.add_resource(Box::new(AuthenticationResource::new(
                self.authentications(),
                auth,
            )));
        }
        plan
    }
}

/// Rewrite the type part of a `type` or `type.name` target to its
/// canonical name, rejecting unknown types.
pub fn normalize_target(target: &str) -> anyhow::Result<String> {
    let (resource_type, name) = match target.split_once('.') {
        Some((t, n)) => (t, Some(n)),
        None => (target, None),
    };
    let canonical = match resource_type {
        "groups" => GROUP_TYPE,
        "auth" | "authentications" => AUTHENTICATION_TYPE,
        t if t.is_empty() || RESOURCE_TYPES.contains(&t) => t,
        t => anyhow::bail!(
            "Unknown resource type \"{t}\" (expected one of: {})",
            RESOURCE_TYPES.join(", ")
        ),
    };
    Ok(match name {
        Some(n) => format!("{canonical}.{n}"),
        None => canonical.to_string(),
    })
}
