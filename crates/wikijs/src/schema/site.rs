//! Site configuration (read-only).

use crate::convert::null_as_default;
use crate::operation::{NoVariables, Operation, OperationKind};
use serde::{Deserialize, Serialize};

/// Public site settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Canonical host URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub host: String,
    /// Site title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Site description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// `site { config }` wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Site {
    /// Site settings.
    pub config: SiteConfig,
}

/// Response of [`GetSite`].
#[derive(Debug, Clone, Deserialize)]
pub struct SiteData {
    /// Site wrapper.
    pub site: Site,
}

/// `query { site { config { host title description } } }`
pub struct GetSite;

impl Operation for GetSite {
    type Variables = NoVariables;
    type Response = SiteData;
    const NAME: &'static str = "GetSite";
    const KIND: OperationKind = OperationKind::Query;
    const DOCUMENT: &'static str = "query GetSite { site { config { host title description } } }";
}
