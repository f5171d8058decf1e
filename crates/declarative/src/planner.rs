//! Execution planner - builds resource execution plans

use crate::resource::{BoxedResource, Resource};

/// An execution plan with resources grouped by how they may run
pub struct ExecutionPlan {
    /// Resources that may run concurrently
    pub parallel: Vec<BoxedResource>,
    /// Resources that must run one at a time, after the parallel batch
    pub sequential: Vec<BoxedResource>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            parallel: Vec::new(),
            sequential: Vec::new(),
        }
    }

    /// Add a resource to the plan, classifying by `can_parallelize`
    pub fn add_resource(&mut self, resource: BoxedResource) {
        if resource.can_parallelize() {
            self.parallel.push(resource);
        } else {
            self.sequential.push(resource);
        }
    }

    /// Filter plan to only include resources matching a predicate
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&dyn Resource) -> bool,
    {
        Self {
            parallel: self
                .parallel
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
            sequential: self
                .sequential
                .into_iter()
                .filter(|r| predicate(r.as_ref()))
                .collect(),
        }
    }

    /// Filter plan to only include resources matching a target pattern
    ///
    /// Target format: "type" or "type.name"
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                self.filter(|r| matches_filter(r, resource_type.as_deref(), name.as_deref()))
            }
        }
    }

    /// All resources, parallel batch first
    pub fn resources(&self) -> impl Iterator<Item = &BoxedResource> {
        self.parallel.iter().chain(self.sequential.iter())
    }

    /// Total number of resources in the plan
    pub fn total_resources(&self) -> usize {
        self.parallel.len() + self.sequential.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.parallel.is_empty() && self.sequential.is_empty()
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a target string like "type.name" into (type, name)
///
/// Only the first dot separates; names may contain dots.
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    match target.split_once('.') {
        None => (Some(target.to_string()), None),
        Some(("", name)) => (None, Some(name.to_string())),
        Some((resource_type, name)) => (Some(resource_type.to_string()), Some(name.to_string())),
    }
}

/// Check if a resource matches the filter criteria
fn matches_filter(
    resource: &dyn Resource,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    if let Some(rt) = resource_type
        && resource.resource_type() != rt
    {
        return false;
    }

    if let Some(n) = name
        && resource.id() != n
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::{ApplyResult, ResourceState};
    use anyhow::Result;

    #[derive(Debug)]
    struct Named {
        kind: &'static str,
        id: &'static str,
        parallel: bool,
    }

    impl Resource for Named {
        fn id(&self) -> String {
            self.id.to_string()
        }
        fn description(&self) -> String {
            self.id.to_string()
        }
        fn resource_type(&self) -> &'static str {
            self.kind
        }
        fn current_state(&self) -> Result<ResourceState> {
            Ok(ResourceState::Absent)
        }
        fn desired_state(&self) -> ResourceState {
            ResourceState::Present { details: None }
        }
        fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::Created)
        }
        fn destroy(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::Removed)
        }
        fn can_parallelize(&self) -> bool {
            self.parallel
        }
    }

    fn plan() -> ExecutionPlan {
        let mut plan = ExecutionPlan::new();
        for (kind, id, parallel) in [
            ("group", "editors", true),
            ("group", "readers", true),
            ("authentication", "corp", false),
        ] {
            plan.add_resource(Box::new(Named { kind, id, parallel }));
        }
        plan
    }

    fn ids(plan: &ExecutionPlan) -> Vec<String> {
        plan.resources().map(|r| r.id()).collect()
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("group"), (Some("group".to_string()), None));
        assert_eq!(
            parse_target("group.editors"),
            (Some("group".to_string()), Some("editors".to_string()))
        );
        assert_eq!(
            parse_target("group.team.a"),
            (Some("group".to_string()), Some("team.a".to_string()))
        );
        assert_eq!(parse_target(".corp"), (None, Some("corp".to_string())));
    }

    #[test]
    fn test_add_resource_classifies() {
        let plan = plan();
        assert_eq!(plan.parallel.len(), 2);
        assert_eq!(plan.sequential.len(), 1);
        assert_eq!(plan.total_resources(), 3);
    }

    #[test]
    fn test_filter_by_type() {
        assert_eq!(ids(&plan().filter_by_target(Some("group"))), vec!["editors", "readers"]);
        assert_eq!(ids(&plan().filter_by_target(Some("authentication"))), vec!["corp"]);
        assert!(plan().filter_by_target(Some("groups")).is_empty());
        assert_eq!(plan().filter_by_target(None).total_resources(), 3);
    }

    #[test]
    fn test_filter_by_name() {
        assert_eq!(ids(&plan().filter_by_target(Some("group.readers"))), vec!["readers"]);
        assert!(plan().filter_by_target(Some("group.corp")).is_empty());
    }
}
