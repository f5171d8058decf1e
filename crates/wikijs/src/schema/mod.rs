//! Wire types for the subset of the Wiki.js schema this crate uses.
//!
//! Each submodule holds the records of one API namespace together with the
//! [`Operation`](crate::Operation) definitions that read or write them.

pub mod authentication;
pub mod common;
pub mod group;
pub mod site;

pub use authentication::{
    AuthenticationActiveStrategy, AuthenticationStrategy, PropertyType, StrategyInput,
    StrategyProperty, StrategyRef,
};
pub use common::{DefaultResponse, KeyValuePair, ResponseStatus};
pub use group::{Group, GroupSummary, GroupUpdate, PageRule, PageRuleMatch};
pub use site::SiteConfig;
