//! Diff computation for resources

use crate::resource::Resource;
use crate::types::ResourceState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A diff between current and desired state of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Unique identifier of the resource
    pub resource_id: String,
    /// Type of the resource
    pub resource_type: String,
    /// Human-readable description
    pub description: String,
    /// Current state
    pub current: ResourceState,
    /// Desired state
    pub desired: ResourceState,
}

impl ResourceDiff {
    /// Create a diff from a resource, returning None if no changes needed
    pub fn from_resource(resource: &dyn Resource) -> Result<Option<Self>> {
        let current = resource.current_state()?;
        let desired = resource.desired_state();
        Ok(Self::between(resource, current, desired))
    }

    /// Create the diff of removing a resource, returning None if already absent
    pub fn for_destroy(resource: &dyn Resource) -> Result<Option<Self>> {
        let current = resource.current_state()?;
        Ok(Self::between(resource, current, ResourceState::Absent))
    }

    fn between(
        resource: &dyn Resource,
        current: ResourceState,
        desired: ResourceState,
    ) -> Option<Self> {
        if current == desired {
            return None;
        }

        Some(Self {
            resource_id: resource.id(),
            resource_type: resource.resource_type().to_string(),
            description: resource.description(),
            current,
            desired,
        })
    }

    /// Check if this diff represents an addition
    pub fn is_addition(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Absent, ResourceState::Present { .. })
        )
    }

    /// Check if this diff represents a removal
    pub fn is_removal(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Present { .. }, ResourceState::Absent)
        )
    }

    /// Check if this diff represents a modification
    pub fn is_modification(&self) -> bool {
        matches!(
            (&self.current, &self.desired),
            (ResourceState::Modified { .. }, _) | (_, ResourceState::Modified { .. })
        ) || matches!(
            (&self.current, &self.desired),
            (
                ResourceState::Present { details: Some(_) },
                ResourceState::Present { details: Some(_) }
            )
        )
    }
}

/// Compute diffs for a list of resources
///
/// Returns only resources that have differences between current and desired state.
/// Resources whose state cannot be read are reported as errors alongside.
pub fn compute_diffs(
    resources: &[Box<dyn Resource>],
) -> (Vec<ResourceDiff>, Vec<(String, anyhow::Error)>) {
    collect(resources, ResourceDiff::from_resource)
}

/// Compute removal diffs for a list of resources
pub fn compute_destroy_diffs(
    resources: &[Box<dyn Resource>],
) -> (Vec<ResourceDiff>, Vec<(String, anyhow::Error)>) {
    collect(resources, ResourceDiff::for_destroy)
}

fn collect<F>(
    resources: &[Box<dyn Resource>],
    diff: F,
) -> (Vec<ResourceDiff>, Vec<(String, anyhow::Error)>)
where
    F: Fn(&dyn Resource) -> Result<Option<ResourceDiff>>,
{
    let mut diffs = Vec::new();
    let mut errors = Vec::new();
    for resource in resources {
        match diff(resource.as_ref()) {
            Ok(Some(d)) => diffs.push(d),
            Ok(None) => {}
            Err(e) => errors.push((resource.id(), e)),
        }
    }
    (diffs, errors)
}

/// Diff summary statistics
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    /// Number of resources to add
    pub additions: usize,
    /// Number of resources to remove
    pub removals: usize,
    /// Number of resources to modify
    pub modifications: usize,
}

impl DiffSummary {
    /// Create a summary from a list of diffs
    pub fn from_diffs(diffs: &[ResourceDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            if diff.is_addition() {
                summary.additions += 1;
            } else if diff.is_removal() {
                summary.removals += 1;
            } else {
                summary.modifications += 1;
            }
        }
        summary
    }

    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

/// Group diffs by resource type, in type order
pub fn group_by_type(diffs: &[ResourceDiff]) -> BTreeMap<String, Vec<&ResourceDiff>> {
    let mut groups: BTreeMap<String, Vec<&ResourceDiff>> = BTreeMap::new();
    for diff in diffs {
        groups
            .entry(diff.resource_type.clone())
            .or_default()
            .push(diff);
    }
    groups
}
