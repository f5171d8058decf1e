//! Local validation of desired state.
//!
//! Wiki.js accepts page rules referencing roles the group does not hold and
//! silently ignores them, so these checks run before any mutation is sent.
//! Every check collects all violations instead of stopping at the first.

use crate::convert::encode_config_value;
use crate::schema::{GroupUpdate, KeyValuePair, PageRule, PropertyType, StrategyProperty};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// `redirect_on_login` does not start with `/`.
    #[error("redirect_on_login \"{0}\" must start with /")]
    RedirectWithoutSlash(String),

    /// A page rule path starts with `/`.
    #[error(
        "page_rules.path \"{path}\" of rule {rule_id} must not start with /; \
         Wiki.js adds it automatically"
    )]
    PathWithSlash {
        /// Offending rule.
        rule_id: String,
        /// Offending path.
        path: String,
    },

    /// A page rule role is missing from the group's global permissions.
    #[error(
        "Tried to set page rule role for unallowed global permission '{role}' in the page rule \
         block of id: {rule_id}; the role must first be enabled under global permissions"
    )]
    RoleNotPermitted {
        /// Offending role.
        role: String,
        /// Rule that references it.
        rule_id: String,
    },

    /// An instance references a module missing from the catalog.
    #[error("strategy \"{key}\" uses unknown strategy module \"{strategy_key}\"")]
    UnknownStrategy {
        /// Instance key.
        key: String,
        /// Module key.
        strategy_key: String,
    },

    /// An instance config key is not a property of its module.
    #[error("strategy module \"{strategy_key}\" has no property \"{property}\"")]
    UnknownProperty {
        /// Module key.
        strategy_key: String,
        /// Unknown property.
        property: String,
    },

    /// A config value cannot be coerced to the declared type.
    #[error("property \"{property}\" expects a {expected} value, got {value}")]
    PropertyType {
        /// Property name.
        property: String,
        /// Declared type.
        expected: PropertyType,
        /// Rejected value, as JSON.
        value: String,
    },

    /// A config value is outside the declared enumeration.
    #[error("property \"{property}\" does not allow {value}; expected one of {}", .allowed.join(", "))]
    PropertyNotInEnum {
        /// Property name.
        property: String,
        /// Rejected value, as JSON.
        value: String,
        /// Allowed values, as JSON.
        allowed: Vec<String>,
    },

    /// An auto-enroll group id does not exist.
    #[error("strategy \"{key}\" auto-enrolls into unknown group {group}")]
    UnknownGroup {
        /// Instance key.
        key: String,
        /// Missing group id.
        group: i32,
    },

    /// An auto-enroll group carries page rules that fail validation.
    #[error("strategy \"{key}\" auto-enrolls into group {group}: {reason}")]
    AutoEnrollGroup {
        /// Instance key.
        key: String,
        /// Group id.
        group: i32,
        /// Underlying violation.
        reason: Box<ValidationError>,
    },
}

/// All violations found in one desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// The individual violations.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Whether there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Check that a login redirect is an absolute path.
#[must_use]
pub fn validate_redirect(redirect: &str) -> Option<ValidationError> {
    if redirect.starts_with('/') {
        None
    } else {
        Some(ValidationError::RedirectWithoutSlash(redirect.to_string()))
    }
}

/// Check that no page rule path carries a leading slash.
#[must_use]
pub fn validate_page_rule_paths(rules: &[PageRule]) -> Vec<ValidationError> {
    rules
        .iter()
        .filter(|rule| rule.path.starts_with('/'))
        .map(|rule| ValidationError::PathWithSlash {
            rule_id: rule.id.clone(),
            path: rule.path.clone(),
        })
        .collect()
}

/// Check that every role referenced by a page rule is a global permission.
///
/// Reports one error per offending role, in rule order.
#[must_use]
pub fn validate_page_rules(rules: &[PageRule], permissions: &BTreeSet<String>) -> Vec<ValidationError> {
    rules
        .iter()
        .flat_map(|rule| {
            rule.roles
                .iter()
                .filter(|role| !permissions.contains(role.as_str()))
                .map(|role| ValidationError::RoleNotPermitted {
                    role: role.clone(),
                    rule_id: rule.id.clone(),
                })
        })
        .collect()
}

/// Run every group check.
pub fn validate_group_update(update: &GroupUpdate) -> Result<(), ValidationErrors> {
    let mut errors: Vec<ValidationError> = validate_redirect(&update.redirect_on_login)
        .into_iter()
        .collect();
    errors.extend(validate_page_rule_paths(&update.page_rules));
    errors.extend(validate_page_rules(&update.page_rules, &update.permissions));
    ValidationErrors::from(errors).into_result()
}

/// Resolve an instance config against its module's property descriptors.
///
/// Values are coerced to the declared types, omitted properties take their
/// declared default, and the result is encoded for `updateStrategies`.
pub fn resolve_strategy_config(
    strategy_key: &str,
    properties: &BTreeMap<String, StrategyProperty>,
    config: &BTreeMap<String, Value>,
) -> Result<Vec<KeyValuePair>, Vec<ValidationError>> {
    let mut errors: Vec<ValidationError> = config
        .keys()
        .filter(|key| !properties.contains_key(key.as_str()))
        .map(|key| ValidationError::UnknownProperty {
            strategy_key: strategy_key.to_string(),
            property: key.clone(),
        })
        .collect();

    let mut resolved = Vec::with_capacity(properties.len());
    for (key, property) in properties {
        let value = match config.get(key) {
            Some(value) => match property.coerce(key, value) {
                Ok(value) => value,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            },
            None => property.default.clone(),
        };
        match encode_config_value(&value) {
            Ok(encoded) => resolved.push(KeyValuePair {
                key: key.clone(),
                value: encoded,
            }),
            Err(err) => errors.push(ValidationError::PropertyType {
                property: key.clone(),
                expected: property.property_type.clone(),
                value: err.to_string(),
            }),
        }
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::to_set;
    use crate::schema::{AuthenticationStrategy, PageRuleMatch};
    use serde_json::json;

    fn rule(id: &str, roles: &[&str], path: &str) -> PageRule {
        PageRule {
            id: id.to_string(),
            deny: false,
            match_mode: PageRuleMatch::Start,
            roles: roles.iter().map(ToString::to_string).collect(),
            path: path.to_string(),
            locales: vec![],
        }
    }

    fn update(redirect: &str, permissions: &[&str], rules: Vec<PageRule>) -> GroupUpdate {
        GroupUpdate {
            id: 1,
            name: "test-group".to_string(),
            redirect_on_login: redirect.to_string(),
            permissions: to_set(permissions.iter().copied()),
            page_rules: rules,
        }
    }

    #[test]
    fn test_valid_update_passes() {
        let update = update("/x", &["read:pages"], vec![rule("r1", &["read:pages"], "test")]);
        assert!(validate_group_update(&update).is_ok());
    }

    #[test]
    fn test_redirect_without_slash() {
        let update = update("home", &["read:pages"], vec![]);
        let errors = validate_group_update(&update).unwrap_err();
        assert_eq!(
            errors.errors(),
            &[ValidationError::RedirectWithoutSlash("home".to_string())]
        );
        assert!(validate_redirect("").is_some());
        assert!(validate_redirect("/").is_none());
    }

    #[test]
    fn test_role_not_permitted_names_role_and_rule() {
        let errors = validate_page_rules(
            &[rule("r1", &["read:pages", "manage:system"], "test")],
            &to_set(["read:pages"]),
        );
        assert_eq!(errors.len(), 1);
        let message = errors[0].to_string();
        assert!(message.contains("'manage:system'"));
        assert!(message.contains("id: r1"));
    }

    #[test]
    fn test_path_with_slash() {
        let errors = validate_page_rule_paths(&[rule("r1", &[], "/test"), rule("r2", &[], "ok")]);
        assert_eq!(
            errors,
            vec![ValidationError::PathWithSlash {
                rule_id: "r1".to_string(),
                path: "/test".to_string(),
            }]
        );
    }

    #[test]
    fn test_all_violations_reported_together() {
        let update = update(
            "home",
            &["read:pages"],
            vec![
                rule("r1", &["write:pages"], "/a"),
                rule("r2", &["delete:pages", "read:pages"], "b"),
            ],
        );
        let errors = validate_group_update(&update).unwrap_err();
        assert_eq!(errors.errors().len(), 4);
        let display = errors.to_string();
        assert!(display.contains("home"));
        assert!(display.contains("'write:pages'"));
        assert!(display.contains("'delete:pages'"));
        assert!(display.contains("\"/a\""));
    }

    #[test]
    fn test_permission_order_is_irrelevant() {
        let rules = [rule("r1", &["read:pages", "write:pages"], "test")];
        assert!(validate_page_rules(&rules, &to_set(["write:pages", "read:pages"])).is_empty());
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationErrors::default().into_result().is_ok());
        let errors = ValidationErrors::from(vec![ValidationError::RedirectWithoutSlash(
            String::new(),
        )]);
        assert!(errors.into_result().is_err());
    }

    fn ldap_properties() -> BTreeMap<String, StrategyProperty> {
        AuthenticationStrategy {
            key: "ldap".to_string(),
            props: vec![
                KeyValuePair {
                    key: "url".to_string(),
                    value: r#"{"type":"String","default":"ldap://serverhost:389"}"#.to_string(),
                },
                KeyValuePair {
                    key: "tlsEnabled".to_string(),
                    value: r#"{"type":"Boolean","default":false}"#.to_string(),
                },
            ],
            ..Default::default()
        }
        .properties()
        .unwrap()
    }

    #[test]
    fn test_resolve_config_coerces_and_fills_defaults() {
        let config = BTreeMap::from([("tlsEnabled".to_string(), json!("true"))]);
        let resolved = resolve_strategy_config("ldap", &ldap_properties(), &config).unwrap();
        let by_key: BTreeMap<_, _> = resolved.into_iter().map(|kv| (kv.key, kv.value)).collect();
        assert_eq!(by_key["tlsEnabled"], r#"{"v":true}"#);
        assert_eq!(by_key["url"], r#"{"v":"ldap://serverhost:389"}"#);
    }

    #[test]
    fn test_resolve_config_rejects_unknown_and_mistyped() {
        let config = BTreeMap::from([
            ("bindDN".to_string(), json!("cn=admin")),
            ("tlsEnabled".to_string(), json!("maybe")),
        ]);
        let errors = resolve_strategy_config("ldap", &ldap_properties(), &config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::UnknownProperty { property, .. } if property == "bindDN")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::PropertyType { property, .. } if property == "tlsEnabled")));
    }
}
