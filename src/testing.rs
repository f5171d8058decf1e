//! In-memory Wiki.js used by the reconciler and command tests.
//!
//! Unlike [`wikijs::MockTransport`], which replays canned replies, this keeps
//! groups and strategies in memory and answers every operation the client
//! sends, so create/read/update/delete sequences behave like a real server.

use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use wikijs::schema::{KeyValuePair, StrategyRef};
use wikijs::transport::Transport;
use wikijs::{
    AuthenticationActiveStrategy, AuthenticationStrategy, Client, Error, GraphqlRequest, Group,
    PageRule, Result, StrategyInput,
};

const TIMESTAMP: &str = "2024-01-01T00:00:00.000Z";

#[derive(Debug, Default)]
struct State {
    groups: BTreeMap<i32, Group>,
    next_id: i32,
    catalog: Vec<AuthenticationStrategy>,
    active: Vec<AuthenticationActiveStrategy>,
    last_strategies: Vec<Value>,
    failures: HashMap<String, String>,
    calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeWiki {
    state: Arc<Mutex<State>>,
}

impl FakeWiki {
    pub fn new() -> Self {
        let wiki = Self::default();
        wiki.lock().next_id = 3;
        wiki
    }

    /// Client over this fake, without the connect probe
    pub fn client(&self) -> Client {
        Client::with_transport(Box::new(self.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Make every later call of `operation` fail with a GraphQL error
    pub fn fail(&self, operation: &str, message: &str) {
        self.lock()
            .failures
            .insert(operation.to_string(), message.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn calls_for(&self, operation: &str) -> usize {
        self.lock().calls.iter().filter(|c| *c == operation).count()
    }

    pub fn seed_group(&self, name: &str, permissions: &[&str]) -> i32 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.groups.insert(
            id,
            Group {
                id,
                name: name.to_string(),
                redirect_on_login: "/".to_string(),
                permissions: permissions.iter().map(ToString::to_string).collect(),
                created_at: TIMESTAMP.to_string(),
                updated_at: TIMESTAMP.to_string(),
                ..Default::default()
            },
        );
        id
    }

    pub fn set_page_rules(&self, id: i32, rules: Vec<PageRule>) {
        if let Some(group) = self.lock().groups.get_mut(&id) {
            group.page_rules = rules;
        }
    }

    pub fn group(&self, id: i32) -> Option<Group> {
        self.lock().groups.get(&id).cloned()
    }

    /// Catalog with a property-less `local` module and a typed `ldap` module
    pub fn seed_catalog(&self) {
        let ldap_props = [
            ("url", json!({ "type": "String", "title": "URL", "default": "", "order": 1 })),
            ("tlsEnabled", json!({ "type": "Boolean", "title": "Use TLS", "default": false, "order": 2 })),
            ("port", json!({ "type": "Number", "title": "Port", "default": 389, "order": 3 })),
            ("mode", json!({ "type": "String", "title": "Mode", "default": "a", "enum": ["a", "b"], "order": 4 })),
        ];
        let mut state = self.lock();
        state.catalog = vec![
            AuthenticationStrategy {
                key: "local".to_string(),
                title: "Local".to_string(),
                is_available: true,
                use_form: true,
                ..Default::default()
            },
            AuthenticationStrategy {
                key: "ldap".to_string(),
                title: "LDAP / Active Directory".to_string(),
                is_available: true,
                use_form: true,
                props: ldap_props
                    .into_iter()
                    .map(|(key, value)| KeyValuePair {
                        key: key.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
                ..Default::default()
            },
        ];
    }

    pub fn seed_active(&self, key: &str, strategy_key: &str) {
        let input = StrategyInput {
            key: key.to_string(),
            strategy_key: strategy_key.to_string(),
            display_name: key.to_string(),
            is_enabled: true,
            ..Default::default()
        };
        let mut state = self.lock();
        let active = activate(&state.catalog, &input);
        state.active.push(active);
    }

    /// Strategies submitted by the last `updateStrategies`
    pub fn last_strategies(&self) -> Vec<Value> {
        self.lock().last_strategies.clone()
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.lock().active.iter().map(|a| a.key.clone()).collect()
    }
}

fn activate(catalog: &[AuthenticationStrategy], input: &StrategyInput) -> AuthenticationActiveStrategy {
    let title = catalog
        .iter()
        .find(|m| m.key == input.strategy_key)
        .map(|m| m.title.clone())
        .unwrap_or_default();
    AuthenticationActiveStrategy {
        key: input.key.clone(),
        strategy: StrategyRef {
            key: input.strategy_key.clone(),
            title,
        },
        display_name: input.display_name.clone(),
        order: input.order,
        is_enabled: input.is_enabled,
        config: input.config.clone(),
        self_registration: input.self_registration,
        domain_whitelist: input.domain_whitelist.clone(),
        auto_enroll_groups: input.auto_enroll_groups.clone(),
    }
}

fn status(succeeded: bool, message: &str) -> Value {
    json!({
        "succeeded": succeeded,
        "errorCode": if succeeded { 0 } else { 1 },
        "slug": if succeeded { "ok" } else { "Failed" },
        "message": message,
    })
}

fn variable<T: serde::de::DeserializeOwned>(request: &GraphqlRequest, name: &str) -> Result<T> {
    let value = request.variable(name).cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

impl Transport for FakeWiki {
    fn execute(&self, request: &GraphqlRequest) -> Result<Value> {
        let mut state = self.lock();
        let operation = request.operation_name.as_str();
        state.calls.push(operation.to_string());

        if let Some(message) = state.failures.get(operation) {
            return Err(Error::Graphql {
                messages: vec![message.clone()],
            });
        }

        let data = match operation {
            "GetSite" => json!({ "site": { "config": {
                "host": "https://wiki.example.com",
                "title": "Example Wiki",
                "description": "Fake",
            } } }),
            "GetGroup" => {
                let id: i32 = variable(request, "id")?;
                json!({ "groups": { "single": state.groups.get(&id) } })
            }
            "ListGroups" => {
                let list: Vec<Value> = state
                    .groups
                    .values()
                    .map(|g| {
                        json!({
                            "id": g.id, "name": g.name, "isSystem": g.is_system,
                            "userCount": 0, "createdAt": g.created_at, "updatedAt": g.updated_at,
                        })
                    })
                    .collect();
                json!({ "groups": { "list": list } })
            }
            "CreateGroup" => {
                let name: String = variable(request, "name")?;
                let id = state.next_id;
                state.next_id += 1;
                let group = Group {
                    id,
                    name,
                    redirect_on_login: "/".to_string(),
                    created_at: TIMESTAMP.to_string(),
                    updated_at: TIMESTAMP.to_string(),
                    ..Default::default()
                };
                state.groups.insert(id, group.clone());
                json!({ "groups": { "create": { "responseResult": status(true, ""), "group": group } } })
            }
            "UpdateGroup" => {
                let id: i32 = variable(request, "id")?;
                let name: String = variable(request, "name")?;
                let redirect: String = variable(request, "redirectOnLogin")?;
                let permissions: Vec<String> = variable(request, "permissions")?;
                let page_rules: Vec<PageRule> = variable(request, "pageRules")?;
                let result = match state.groups.get_mut(&id) {
                    Some(group) => {
                        group.name = name;
                        group.redirect_on_login = redirect;
                        group.permissions = permissions;
                        group.page_rules = page_rules;
                        status(true, "Group has been updated.")
                    }
                    None => status(false, "Invalid Group ID"),
                };
                json!({ "groups": { "update": { "responseResult": result } } })
            }
            "DeleteGroup" => {
                let id: i32 = variable(request, "id")?;
                let result = match state.groups.remove(&id) {
                    Some(_) => status(true, "Group has been deleted."),
                    None => status(false, "Invalid Group ID"),
                };
                json!({ "groups": { "delete": { "responseResult": result } } })
            }
            "GetStrategies" => json!({ "authentication": { "strategies": state.catalog } }),
            "GetActiveStrategies" => {
                let enabled_only: bool = variable(request, "enabledOnly")?;
                let active: Vec<&AuthenticationActiveStrategy> = state
                    .active
                    .iter()
                    .filter(|a| !enabled_only || a.is_enabled)
                    .collect();
                json!({ "authentication": { "activeStrategies": active } })
            }
            "UpdateStrategies" => {
                let raw: Vec<Value> = variable(request, "strategies")?;
                let inputs: Vec<StrategyInput> = variable(request, "strategies")?;
                let active = inputs.iter().map(|i| activate(&state.catalog, i)).collect();
                state.active = active;
                state.last_strategies = raw;
                json!({ "authentication": { "updateStrategies": {
                    "responseResult": status(true, "Strategies updated successfully"),
                } } })
            }
            other => return Err(Error::Other(format!("unsupported operation {other}"))),
        };

        Ok(data)
    }
}
