//! Reconcilers for the resource types Wiki.js exposes.
//!
//! Each resource type has:
//! - A state handle holding identity and last known values
//! - A reconciler with `create`/`read`/`update`/`delete` entry points over the client
//! - A [`declarative::Resource`] binding one desired entry to its reconciler

pub mod authentication;
pub mod group;

pub use authentication::{AuthenticationReconciler, AuthenticationResource};
pub use group::{GroupData, GroupReconciler, GroupResource};

use chrono::Local;

/// `last_updated` uses the RFC 850 layout.
const LAST_UPDATED_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S %Z";

/// Local time stamped after every successful update
pub(crate) fn last_updated_now() -> String {
    Local::now().format(LAST_UPDATED_FORMAT).to_string()
}
