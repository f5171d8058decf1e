//! Authentication resource - a named bundle of active strategies
//!
//! Wiki.js only exposes `updateStrategies`, which replaces the whole active
//! list. Every write therefore reads the current list, swaps in the managed
//! instances by key and submits the result; instances owned by nobody in the
//! desired state are carried over untouched.

use anyhow::Result as AnyResult;
use declarative::{ApplyContext, ApplyResult, Diagnostics, Resource, ResourceState};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::Arc;
use wikijs::convert::to_set;
use wikijs::validation::{resolve_strategy_config, validate_page_rules};
use wikijs::{
    AuthenticationActiveStrategy, Client, Group, Result, StrategyInput, StrategyProperty,
    ValidationError, ValidationErrors,
};

use crate::config::{AuthenticationConfig, StrategyConfig};

/// Resource type name used in targets and diffs
pub const AUTHENTICATION_TYPE: &str = "authentication";

/// Property descriptors keyed by module key, then property name
pub type Catalog = BTreeMap<String, BTreeMap<String, StrategyProperty>>;

/// State handle for one authentication bundle
///
/// `id` is the bundle name once the managed instances exist remotely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthenticationData {
    pub id: String,
    pub name: String,
    pub strategies: Vec<StrategyConfig>,
    /// Managed instances as last read from Wiki.js
    pub active: Vec<AuthenticationActiveStrategy>,
    pub last_updated: String,
}

impl AuthenticationData {
    pub fn from_config(config: &AuthenticationConfig) -> Self {
        Self {
            name: config.name.clone(),
            strategies: config.strategies.clone(),
            ..Default::default()
        }
    }

    pub fn has_identity(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn clear_identity(&mut self) {
        self.id.clear();
        self.active.clear();
    }

    /// Instance keys this bundle owns
    pub fn managed_keys(&self) -> BTreeSet<&str> {
        self.strategies.iter().map(|s| s.key.as_str()).collect()
    }

    /// Desired instances in the same text form as [`Self::render_remote`]
    pub fn render(&self) -> String {
        let mut strategies: Vec<&StrategyConfig> = self.strategies.iter().collect();
        strategies.sort_by(|a, b| a.key.cmp(&b.key));

        let mut out = String::new();
        for s in strategies {
            render_strategy(
                &mut out,
                &StrategyView {
                    key: &s.key,
                    strategy_key: &s.strategy_key,
                    display_name: display_name(s),
                    order: s.order,
                    is_enabled: s.is_enabled,
                    self_registration: s.self_registration,
                    domain_whitelist: &s.domain_whitelist,
                    auto_enroll_groups: &s.auto_enroll_groups,
                    config: s.config.clone(),
                },
            );
        }
        out
    }

    /// Whether any managed instance exists in `active`
    pub fn is_present(&self, active: &[AuthenticationActiveStrategy]) -> bool {
        let keys = self.managed_keys();
        active.iter().any(|a| keys.contains(a.key.as_str()))
    }

    /// Managed instances found in `active`, or `None` if there are none.
    ///
    /// Only config keys the desired state declares are shown, so defaults
    /// filled in by Wiki.js do not count as drift. A remote value equal to
    /// the declared value after catalog coercion renders as the declared
    /// value, so `" 389 "` and `389` compare equal.
    pub fn render_remote(
        &self,
        active: &[AuthenticationActiveStrategy],
        catalog: &Catalog,
    ) -> Option<String> {
        let desired: BTreeMap<&str, &StrategyConfig> =
            self.strategies.iter().map(|s| (s.key.as_str(), s)).collect();
        let mut managed: Vec<&AuthenticationActiveStrategy> = active
            .iter()
            .filter(|a| desired.contains_key(a.key.as_str()))
            .collect();
        if managed.is_empty() {
            return None;
        }
        managed.sort_by(|a, b| a.key.cmp(&b.key));

        let mut out = String::new();
        for a in managed {
            let declared = desired.get(a.key.as_str()).map(|s| &s.config);
            let properties = catalog.get(&a.strategy.key);
            let config = a
                .config_values()
                .into_iter()
                .filter_map(|(key, remote)| {
                    let wanted = declared?.get(&key)?;
                    let converged = properties
                        .and_then(|p| p.get(&key))
                        .and_then(|p| p.coerce(&key, wanted).ok())
                        .is_some_and(|coerced| coerced == remote);
                    Some((key, if converged { wanted.clone() } else { remote }))
                })
                .collect();
            render_strategy(
                &mut out,
                &StrategyView {
                    key: &a.key,
                    strategy_key: &a.strategy.key,
                    display_name: &a.display_name,
                    order: a.order,
                    is_enabled: a.is_enabled,
                    self_registration: a.self_registration,
                    domain_whitelist: &a.domain_whitelist,
                    auto_enroll_groups: &a.auto_enroll_groups,
                    config,
                },
            );
        }
        Some(out)
    }
}

/// Display name submitted for an instance; defaults to its key
fn display_name(strategy: &StrategyConfig) -> &str {
    if strategy.display_name.is_empty() {
        &strategy.key
    } else {
        &strategy.display_name
    }
}

struct StrategyView<'a> {
    key: &'a str,
    strategy_key: &'a str,
    display_name: &'a str,
    order: i32,
    is_enabled: bool,
    self_registration: bool,
    domain_whitelist: &'a [String],
    auto_enroll_groups: &'a [i32],
    config: BTreeMap<String, Value>,
}

fn render_strategy(out: &mut String, view: &StrategyView<'_>) {
    let groups: Vec<String> = view.auto_enroll_groups.iter().map(ToString::to_string).collect();
    let _ = writeln!(out, "strategy {} ({})", view.key, view.strategy_key);
    let _ = writeln!(out, "  display_name = {}", view.display_name);
    let _ = writeln!(out, "  order = {}", view.order);
    let _ = writeln!(out, "  is_enabled = {}", view.is_enabled);
    let _ = writeln!(out, "  self_registration = {}", view.self_registration);
    let _ = writeln!(out, "  domain_whitelist = [{}]", view.domain_whitelist.join(", "));
    let _ = writeln!(out, "  auto_enroll_groups = [{}]", groups.join(", "));
    for (key, value) in &view.config {
        let _ = writeln!(out, "  config.{key} = {}", render_value(value));
    }
}

/// Strings render bare so `"true"` and `true` compare equal after coercion
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Reconciler
// ============================================================================

/// Authentication create/read/update/delete over the GraphQL client
#[derive(Clone)]
pub struct AuthenticationReconciler {
    client: Arc<Client>,
}

impl AuthenticationReconciler {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Every configured instance, enabled or not
    pub fn active(&self) -> Result<Vec<AuthenticationActiveStrategy>> {
        self.client.active_strategies(false)
    }

    /// Property descriptors of every catalog module
    pub fn catalog(&self) -> Result<Catalog> {
        self.client
            .strategies()?
            .into_iter()
            .map(|module| Ok((module.key.clone(), module.properties()?)))
            .collect()
    }

    /// Assign identity, then submit the instances.
    ///
    /// A remote failure is followed by a best-effort delete of the managed
    /// instances; the update error is returned.
    pub fn create(&self, data: &mut AuthenticationData, diagnostics: &mut Diagnostics) -> Result<()> {
        log::debug!("Creating authentication {}", data.name);
        data.id = data.name.clone();

        if let Err(err) = self.update(data, diagnostics) {
            if !err.category().is_local() {
                log::debug!("Update of new authentication {} failed, deleting it", data.name);
                if let Err(cleanup) = self.delete(data) {
                    log::warn!(
                        "Could not remove partially configured authentication {}: {cleanup}",
                        data.name
                    );
                }
            }
            data.clear_identity();
            return Err(err);
        }
        Ok(())
    }

    /// Refresh the handle with the managed instances that exist remotely.
    ///
    /// If none remain, identity is cleared and a warning is raised.
    pub fn read(&self, data: &mut AuthenticationData, diagnostics: &mut Diagnostics) -> Result<()> {
        let keys = data.managed_keys();
        let managed: Vec<AuthenticationActiveStrategy> = self
            .active()?
            .into_iter()
            .filter(|a| keys.contains(a.key.as_str()))
            .collect();

        if managed.is_empty() {
            let detail = format!(
                "authentication {} no longer exists due to a change outside of wikijs-sync; \
                 it has been removed from the local state",
                data.name
            );
            log::warn!("{detail}");
            diagnostics.warn(
                format!("authentication \"{}\" no longer exists", data.name),
                detail,
            );
            data.clear_identity();
        } else {
            data.active = managed;
        }
        Ok(())
    }

    /// Validate the instances against the catalog and merge them into the
    /// active list.
    pub fn update(&self, data: &mut AuthenticationData, diagnostics: &mut Diagnostics) -> Result<()> {
        let inputs = self.resolve(&data.strategies)?;

        let mut merged: Vec<StrategyInput> =
            self.active()?.iter().map(StrategyInput::from).collect();
        for input in inputs {
            match merged.iter_mut().find(|m| m.key == input.key) {
                Some(slot) => *slot = input,
                None => merged.push(input),
            }
        }

        log::debug!(
            "Updating authentication {} ({} active strategies)",
            data.name,
            merged.len()
        );
        self.client.update_strategies(merged)?;
        data.last_updated = super::last_updated_now();
        self.read(data, diagnostics)
    }

    /// Submit the active list without the managed instances.
    pub fn delete(&self, data: &mut AuthenticationData) -> Result<()> {
        let keys = data.managed_keys();
        let remaining: Vec<StrategyInput> = self
            .active()?
            .iter()
            .filter(|a| !keys.contains(a.key.as_str()))
            .map(StrategyInput::from)
            .collect();

        log::debug!("Deleting authentication {}", data.name);
        self.client.update_strategies(remaining)?;
        data.clear_identity();
        Ok(())
    }

    /// Turn desired instances into mutation inputs, collecting every violation
    fn resolve(&self, strategies: &[StrategyConfig]) -> Result<Vec<StrategyInput>> {
        let catalog = self.client.strategies()?;
        let mut errors = Vec::new();
        let mut inputs = Vec::with_capacity(strategies.len());

        for strategy in strategies {
            let Some(module) = catalog.iter().find(|m| m.key == strategy.strategy_key) else {
                errors.push(ValidationError::UnknownStrategy {
                    key: strategy.key.clone(),
                    strategy_key: strategy.strategy_key.clone(),
                });
                continue;
            };

            let properties = module.properties()?;
            match resolve_strategy_config(&strategy.strategy_key, &properties, &strategy.config) {
                Ok(config) => inputs.push(StrategyInput {
                    key: strategy.key.clone(),
                    strategy_key: strategy.strategy_key.clone(),
                    config,
                    display_name: display_name(strategy).to_string(),
                    order: strategy.order,
                    is_enabled: strategy.is_enabled,
                    self_registration: strategy.self_registration,
                    domain_whitelist: strategy.domain_whitelist.clone(),
                    auto_enroll_groups: strategy.auto_enroll_groups.clone(),
                }),
                Err(violations) => errors.extend(violations),
            }
        }

        errors.extend(self.check_auto_enroll(strategies)?);
        ValidationErrors::from(errors).into_result()?;
        Ok(inputs)
    }

    /// Auto-enroll groups must exist and hold every role their page rules use
    fn check_auto_enroll(&self, strategies: &[StrategyConfig]) -> Result<Vec<ValidationError>> {
        let mut groups: BTreeMap<i32, Option<Group>> = BTreeMap::new();
        let mut errors = Vec::new();

        for strategy in strategies {
            for &id in &strategy.auto_enroll_groups {
                let group = match groups.entry(id) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => entry.insert(self.client.group(id)?),
                };
                match group {
                    None => errors.push(ValidationError::UnknownGroup {
                        key: strategy.key.clone(),
                        group: id,
                    }),
                    Some(group) => {
                        let permissions = to_set(group.permissions.iter().cloned());
                        errors.extend(
                            validate_page_rules(&group.page_rules, &permissions)
                                .into_iter()
                                .map(|reason| ValidationError::AutoEnrollGroup {
                                    key: strategy.key.clone(),
                                    group: id,
                                    reason: Box::new(reason),
                                }),
                        );
                    }
                }
            }
        }

        Ok(errors)
    }
}

// ============================================================================
// Declarative binding
// ============================================================================

/// One `[[authentication]]` entry of the desired state
pub struct AuthenticationResource {
    reconciler: AuthenticationReconciler,
    desired: AuthenticationData,
}

impl std::fmt::Debug for AuthenticationResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationResource")
            .field("desired", &self.desired)
            .finish_non_exhaustive()
    }
}

impl AuthenticationResource {
    pub fn new(reconciler: AuthenticationReconciler, config: &AuthenticationConfig) -> Self {
        Self {
            reconciler,
            desired: AuthenticationData::from_config(config),
        }
    }
}

impl Resource for AuthenticationResource {
    fn id(&self) -> String {
        self.desired.name.clone()
    }

    fn description(&self) -> String {
        let keys: Vec<&str> = self.desired.managed_keys().into_iter().collect();
        format!("authentication {} [{}]", self.desired.name, keys.join(", "))
    }

    fn resource_type(&self) -> &'static str {
        AUTHENTICATION_TYPE
    }

    fn current_state(&self) -> AnyResult<ResourceState> {
        let active = self.reconciler.active()?;
        let catalog = self.reconciler.catalog()?;
        Ok(match self.desired.render_remote(&active, &catalog) {
            Some(details) => ResourceState::Present {
                details: Some(details),
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
        let active = self.reconciler.active()?;
        let catalog = self.reconciler.catalog()?;
        let mut data = self.desired.clone();

        match self.desired.render_remote(&active, &catalog) {
            Some(current) if current == data.render() => Ok(ApplyResult::NoChange),
            Some(_) => {
                data.id = data.name.clone();
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
        let active = self.reconciler.active()?;
        if !self.desired.is_present(&active) {
            return Ok(ApplyResult::NoChange);
        }
        let mut data = self.desired.clone();
        data.id = data.name.clone();
        self.reconciler.delete(&mut data)?;
        Ok(ApplyResult::Removed)
    }

    /// The active list is replaced wholesale, so writes must not interleave
    fn can_parallelize(&self) -> bool {
        false
    }
}
