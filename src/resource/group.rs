//! Group resource - permission sets and their page rules

use anyhow::Result as AnyResult;
use declarative::{ApplyContext, ApplyResult, Diagnostics, Resource, ResourceState};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::sync::Arc;
use wikijs::convert::{format_id, parse_id, to_set};
use wikijs::validation::validate_group_update;
use wikijs::{Client, Group, GroupSummary, GroupUpdate, PageRule, Result};

use crate::config::GroupConfig;

/// Resource type name used in targets and diffs
pub const GROUP_TYPE: &str = "group";

/// State handle for one group
///
/// `id` is empty while the group has no remote counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupData {
    pub id: String,
    pub name: String,
    pub is_system: bool,
    pub redirect_on_login: String,
    pub permissions: BTreeSet<String>,
    pub page_rules: Vec<PageRule>,
    pub created_at: String,
    pub updated_at: String,
    pub last_updated: String,
}

impl GroupData {
    pub fn from_config(config: &GroupConfig) -> Self {
        Self {
            id: config.id.map(format_id).unwrap_or_default(),
            name: config.name.clone(),
            redirect_on_login: config.redirect_on_login.clone(),
            permissions: config.permissions.clone(),
            page_rules: config.page_rules.clone(),
            ..Default::default()
        }
    }

    pub fn from_remote(group: &Group) -> Self {
        let mut data = Self::default();
        data.refresh(group);
        data
    }

    pub fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }

    /// Replace every remote-owned field with the values read back
    pub fn refresh(&mut self, group: &Group) {
        self.id = format_id(group.id);
        self.name = group.name.clone();
        self.is_system = group.is_system;
        self.redirect_on_login = group.redirect_on_login.clone();
        self.permissions = to_set(group.permissions.iter().cloned());
        self.page_rules = group.page_rules.clone();
        self.created_at = group.created_at.clone();
        self.updated_at = group.updated_at.clone();
    }

    pub fn clear_identity(&mut self) {
        self.id.clear();
    }

    fn to_update(&self, id: i32) -> GroupUpdate {
        GroupUpdate {
            id,
            name: self.name.clone(),
            redirect_on_login: self.redirect_on_login.clone(),
            permissions: self.permissions.clone(),
            page_rules: self.page_rules.clone(),
        }
    }

    /// Stable text form of the managed fields, one per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "name = {:?}", self.name);
        let _ = writeln!(out, "redirect_on_login = {:?}", self.redirect_on_login);
        let permissions: Vec<&str> = self.permissions.iter().map(String::as_str).collect();
        let _ = writeln!(out, "permissions = [{}]", permissions.join(", "));
        for rule in &self.page_rules {
            let _ = writeln!(
                out,
                "page_rule {} = {} {} {:?} roles [{}] locales [{}]",
                rule.id,
                if rule.deny { "deny" } else { "allow" },
                rule.match_mode,
                rule.path,
                rule.roles.join(", "),
                rule.locales.join(", ")
            );
        }
        out
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// Group create/read/update/delete over the GraphQL client
#[derive(Clone)]
pub struct GroupReconciler {
    client: Arc<Client>,
}

impl GroupReconciler {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub fn get(&self, id: i32) -> Result<Option<Group>> {
        self.client.group(id)
    }

    pub fn list(&self) -> Result<Vec<GroupSummary>> {
        self.client.groups()
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<GroupSummary>> {
        Ok(self.list()?.into_iter().find(|g| g.name == name))
    }

    /// Create the group, then configure it with a follow-up update.
    ///
    /// If the update fails the new group is deleted again and the update
    /// error is returned.
    pub fn create(&self, data: &mut GroupData, diagnostics: &mut Diagnostics) -> Result<()> {
        validate_group_update(&data.to_update(0))?;

        log::debug!("Creating group {}", data.name);
        let group = self.client.create_group(&data.name)?;
        data.id = format_id(group.id);
        log::trace!("Group {} created with id {}", data.name, group.id);

        if let Err(err) = self.update(data, diagnostics) {
            log::debug!("Update of new group {} failed, deleting it", group.id);
            if let Err(cleanup) = self.client.delete_group(group.id) {
                log::warn!("Could not delete partially configured group {}: {cleanup}", group.id);
            }
            data.clear_identity();
            return Err(err);
        }
        Ok(())
    }

    /// Refresh the handle from the remote group.
    ///
    /// A group removed outside this tool clears the identity and raises a
    /// warning instead of failing.
    pub fn read(&self, data: &mut GroupData, diagnostics: &mut Diagnostics) -> Result<()> {
        let id = parse_id(&data.id)?;
        match self.get(id)? {
            Some(group) => data.refresh(&group),
            None => {
                let detail = format!(
                    "group with id {} and name {} no longer exists due to a change outside of \
                     wikijs-sync; it has been removed from the local state",
                    data.id, data.name
                );
                log::warn!("{detail}");
                diagnostics.warn(format!("group \"{}\" no longer exists", data.name), detail);
                data.clear_identity();
            }
        }
        Ok(())
    }

    /// Submit the handle's fields, validating them first.
    pub fn update(&self, data: &mut GroupData, diagnostics: &mut Diagnostics) -> Result<()> {
        let id = parse_id(&data.id)?;
        log::debug!("Updating group {id} ({})", data.name);
        self.client.update_group(&data.to_update(id))?;
        data.last_updated = super::last_updated_now();
        self.read(data, diagnostics)
    }

    pub fn delete(&self, data: &mut GroupData) -> Result<()> {
        let id = parse_id(&data.id)?;
        log::debug!("Deleting group {id} ({})", data.name);
        self.client.delete_group(id)?;
        data.clear_identity();
        Ok(())
    }

    /// Remote group matching a desired entry: by pinned id, else by name
    fn resolve(&self, desired: &GroupData) -> Result<Option<Group>> {
        if desired.has_identity() {
            return self.get(parse_id(&desired.id)?);
        }
        match self.find_by_name(&desired.name)? {
            Some(summary) => self.get(summary.id),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Declarative binding
// ============================================================================

/// One `[[group]]` entry of the desired state
pub struct GroupResource {
    reconciler: GroupReconciler,
    desired: GroupData,
}

impl std::fmt::Debug for GroupResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupResource")
            .field("desired", &self.desired)
            .finish_non_exhaustive()
    }
}

impl GroupResource {
    pub fn new(reconciler: GroupReconciler, config: &GroupConfig) -> Self {
        Self {
            reconciler,
            desired: GroupData::from_config(config),
        }
    }
}

impl Resource for GroupResource {
    fn id(&self) -> String {
        self.desired.name.clone()
    }

    fn description(&self) -> String {
        format!("group {}", self.desired.name)
    }

    fn resource_type(&self) -> &'static str {
        GROUP_TYPE
    }

    fn current_state(&self) -> AnyResult<ResourceState> {
        Ok(match self.reconciler.resolve(&self.desired)? {
            Some(group) => ResourceState::Present {
                details: Some(GroupData::from_remote(&group).render()),
            },
            None => ResourceState::Absent,
        })
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present {
            details: Some(self.desired.render()),
        }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> AnyResult<ApplyResult> {
        let mut data = self.desired.clone();
        let existing = match self.reconciler.resolve(&data)? {
            Some(group) => Some(group),
            None if data.has_identity() => {
                // Pinned id vanished; report the drift and recreate
                let mut stale = data.clone();
                self.reconciler.read(&mut stale, &mut ctx.diagnostics)?;
                data.clear_identity();
                None
            }
            None => None,
        };

        match existing {
            Some(group) if GroupData::from_remote(&group).render() == data.render() => {
                Ok(ApplyResult::NoChange)
            }
            Some(group) => {
                data.id = format_id(group.id);
                self.reconciler.update(&mut data, &mut ctx.diagnostics)?;
                Ok(ApplyResult::Modified)
            }
            None => {
                self.reconciler.create(&mut data, &mut ctx.diagnostics)?;
                Ok(ApplyResult::Created)
            }
        }
    }

    fn destroy(&self, _ctx: &mut ApplyContext) -> AnyResult<ApplyResult> {
        match self.reconciler.resolve(&self.desired)? {
            Some(group) => {
                let mut data = GroupData::from_remote(&group);
                self.reconciler.delete(&mut data)?;
                Ok(ApplyResult::Removed)
            }
            None => Ok(ApplyResult::NoChange),
        }
    }
}
