//! Authentication strategies: the module catalog and the configured instances.
//!
//! Wiki.js describes each strategy module with a list of property descriptors.
//! A descriptor arrives as a `{key, value}` pair whose `value` is itself JSON;
//! [`AuthenticationStrategy::properties`] decodes them into [`StrategyProperty`].

use crate::convert::{compact_list, decode_config_value, null_as_default};
use crate::error::{Error, Result};
use crate::operation::{NoVariables, Operation, OperationKind};
use crate::schema::common::{DefaultResponse, KeyValuePair};
use crate::validation::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Declared type of a strategy property.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    /// Free text.
    #[default]
    String,
    /// Integer or decimal.
    Number,
    /// Flag.
    Boolean,
    /// Any type the client does not coerce.
    Other(String),
}

impl From<String> for PropertyType {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            _ => Self::Other(name),
        }
    }
}

impl From<PropertyType> for String {
    fn from(ty: PropertyType) -> Self {
        ty.to_string()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Number => f.write_str("Number"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Decoded property descriptor of a strategy module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategyProperty {
    /// Value used when an instance omits the property.
    pub default: Value,
    /// Declared type.
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub property_type: PropertyType,
    /// Display title.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// Help text.
    #[serde(deserialize_with = "null_as_default")]
    pub hint: String,
    /// Allowed values, when the property is an enumeration.
    #[serde(rename = "enum")]
    pub allowed: Value,
    /// Rendered as a multi-line field.
    #[serde(deserialize_with = "null_as_default")]
    pub multiline: bool,
    /// Holds a secret.
    #[serde(deserialize_with = "null_as_default")]
    pub sensitive: bool,
    /// Display width hint.
    #[serde(deserialize_with = "null_as_default")]
    pub max_width: i32,
    /// Display order.
    #[serde(deserialize_with = "null_as_default")]
    pub order: i32,
    /// Current value; only set on active strategy config.
    pub value: Value,
}

impl StrategyProperty {
    /// Allowed values, if the property is an enumeration.
    ///
    /// Older modules publish `enum: false` for free-form properties.
    #[must_use]
    pub fn allowed_values(&self) -> Option<&[Value]> {
        match &self.allowed {
            Value::Array(values) if !values.is_empty() => Some(values),
            _ => None,
        }
    }

    /// Coerce `value` to the declared type and check it against the enum.
    pub fn coerce(&self, key: &str, value: &Value) -> std::result::Result<Value, ValidationError> {
        let coerced = match (&self.property_type, value) {
            (PropertyType::Boolean, Value::Bool(_))
            | (PropertyType::Number, Value::Number(_))
            | (PropertyType::String, Value::String(_))
            | (PropertyType::Other(_), _) => Some(value.clone()),
            (PropertyType::Boolean, Value::String(s)) => match s.trim() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            (PropertyType::Number, Value::String(s)) => parse_number(s.trim()),
            (PropertyType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
            (PropertyType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
            _ => None,
        };

        let coerced = coerced.ok_or_else(|| ValidationError::PropertyType {
            property: key.to_string(),
            expected: self.property_type.clone(),
            value: value.to_string(),
        })?;

        if let Some(allowed) = self.allowed_values()
            && !allowed.contains(&coerced)
        {
            return Err(ValidationError::PropertyNotInEnum {
                property: key.to_string(),
                value: coerced.to_string(),
                allowed: allowed.iter().map(ToString::to_string).collect(),
            });
        }

        Ok(coerced)
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

/// A strategy module from the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticationStrategy {
    /// Permanent module key, e.g. `ldap`.
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    /// Property descriptors; `value` is a JSON-encoded [`StrategyProperty`].
    #[serde(deserialize_with = "compact_list")]
    pub props: Vec<KeyValuePair>,
    /// Display title.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// Description.
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    /// Whether the module can be used.
    #[serde(deserialize_with = "null_as_default")]
    pub is_available: bool,
    /// Uses the login form.
    #[serde(deserialize_with = "null_as_default")]
    pub use_form: bool,
    /// Kind of username the module expects.
    #[serde(deserialize_with = "null_as_default")]
    pub username_type: String,
    /// Logo URL.
    #[serde(deserialize_with = "null_as_default")]
    pub logo: String,
    /// Brand color.
    #[serde(deserialize_with = "null_as_default")]
    pub color: String,
    /// Vendor website.
    #[serde(deserialize_with = "null_as_default")]
    pub website: String,
    /// Icon name.
    #[serde(deserialize_with = "null_as_default")]
    pub icon: String,
}

impl AuthenticationStrategy {
    /// Decode every property descriptor, keyed by property name.
    pub fn properties(&self) -> Result<BTreeMap<String, StrategyProperty>> {
        self.props
            .iter()
            .map(|prop| {
                let parsed = serde_json::from_str::<StrategyProperty>(&prop.value).map_err(|e| {
                    Error::InvalidResponse(format!(
                        "property {}.{}: {e}",
                        self.key, prop.key
                    ))
                })?;
                Ok((prop.key.clone(), parsed))
            })
            .collect()
    }
}

/// Minimal strategy reference embedded in an active strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyRef {
    /// Module key.
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    /// Module title.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
}

/// A configured strategy instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticationActiveStrategy {
    /// Instance key.
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    /// Module this instance uses.
    pub strategy: StrategyRef,
    /// Name shown on the login page.
    #[serde(deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Position on the login page.
    #[serde(deserialize_with = "null_as_default")]
    pub order: i32,
    /// Whether users can log in with it.
    #[serde(deserialize_with = "null_as_default")]
    pub is_enabled: bool,
    /// Instance config; values are JSON-encoded.
    #[serde(deserialize_with = "compact_list")]
    pub config: Vec<KeyValuePair>,
    /// Unknown users may register.
    #[serde(deserialize_with = "null_as_default")]
    pub self_registration: bool,
    /// Email domains allowed to register.
    #[serde(deserialize_with = "compact_list")]
    pub domain_whitelist: Vec<String>,
    /// Groups new users join.
    #[serde(deserialize_with = "compact_list")]
    pub auto_enroll_groups: Vec<i32>,
}

impl AuthenticationActiveStrategy {
    /// Decoded config values keyed by property name.
    #[must_use]
    pub fn config_values(&self) -> BTreeMap<String, Value> {
        self.config
            .iter()
            .map(|kv| (kv.key.clone(), decode_config_value(&kv.value)))
            .collect()
    }
}

/// `AuthenticationStrategyInput` as submitted to `updateStrategies`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInput {
    /// Instance key.
    pub key: String,
    /// Module key.
    pub strategy_key: String,
    /// Config with `{"v": ...}` encoded values.
    pub config: Vec<KeyValuePair>,
    /// Name shown on the login page.
    pub display_name: String,
    /// Position on the login page.
    pub order: i32,
    /// Whether users can log in with it.
    pub is_enabled: bool,
    /// Unknown users may register.
    pub self_registration: bool,
    /// Email domains allowed to register.
    pub domain_whitelist: Vec<String>,
    /// Groups new users join.
    pub auto_enroll_groups: Vec<i32>,
}

impl From<&AuthenticationActiveStrategy> for StrategyInput {
    /// Re-submit an existing instance unchanged.
    fn from(active: &AuthenticationActiveStrategy) -> Self {
        let config = active
            .config
            .iter()
            .map(|kv| KeyValuePair {
                key: kv.key.clone(),
                value: serde_json::json!({ "v": decode_config_value(&kv.value) }).to_string(),
            })
            .collect();
        Self {
            key: active.key.clone(),
            strategy_key: active.strategy.key.clone(),
            config,
            display_name: active.display_name.clone(),
            order: active.order,
            is_enabled: active.is_enabled,
            self_registration: active.self_registration,
            domain_whitelist: active.domain_whitelist.clone(),
            auto_enroll_groups: active.auto_enroll_groups.clone(),
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// `authentication` namespace of [`GetStrategies`].
#[derive(Debug, Clone, Deserialize)]
pub struct StrategiesNamespace {
    /// Catalog.
    #[serde(default, deserialize_with = "compact_list")]
    pub strategies: Vec<AuthenticationStrategy>,
}

/// Response of [`GetStrategies`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryStrategiesData {
    /// `authentication` namespace.
    pub authentication: StrategiesNamespace,
}

/// `query { authentication { strategies { ... } } }`
pub struct GetStrategies;

impl Operation for GetStrategies {
    type Variables = NoVariables;
    type Response = QueryStrategiesData;
    const NAME: &'static str = "GetStrategies";
    const KIND: OperationKind = OperationKind::Query;
    const DOCUMENT: &'static str = "query GetStrategies { authentication { strategies { \
        key props { key value } title description isAvailable useForm usernameType \
        logo color website icon } } }";
}

/// Variables of [`GetActiveStrategies`].
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStrategiesVariables {
    /// Only return enabled instances.
    pub enabled_only: bool,
}

/// `authentication` namespace of [`GetActiveStrategies`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveStrategiesNamespace {
    /// Configured instances.
    #[serde(default, deserialize_with = "compact_list")]
    pub active_strategies: Vec<AuthenticationActiveStrategy>,
}

/// Response of [`GetActiveStrategies`].
#[derive(Debug, Clone, Deserialize)]
pub struct QueryActiveStrategiesData {
    /// `authentication` namespace.
    pub authentication: ActiveStrategiesNamespace,
}

/// `query ($enabledOnly: Boolean) { authentication { activeStrategies(...) { ... } } }`
pub struct GetActiveStrategies;

impl Operation for GetActiveStrategies {
    type Variables = ActiveStrategiesVariables;
    type Response = QueryActiveStrategiesData;
    const NAME: &'static str = "GetActiveStrategies";
    const KIND: OperationKind = OperationKind::Query;
    const DOCUMENT: &'static str = "query GetActiveStrategies($enabledOnly: Boolean) { \
        authentication { activeStrategies(enabledOnly: $enabledOnly) { \
        key strategy { key title } displayName order isEnabled config { key value } \
        selfRegistration domainWhitelist autoEnrollGroups } } }";
}

/// Variables of [`UpdateStrategies`].
#[derive(Debug, Clone, Serialize)]
pub struct UpdateStrategiesVariables {
    /// Complete replacement list of active strategies.
    pub strategies: Vec<StrategyInput>,
}

/// `authentication` namespace of [`UpdateStrategies`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStrategiesNamespace {
    /// Update payload.
    pub update_strategies: DefaultResponse,
}

/// Response of [`UpdateStrategies`].
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStrategiesData {
    /// `authentication` namespace.
    pub authentication: UpdateStrategiesNamespace,
}

/// `mutation ($strategies: [AuthenticationStrategyInput]!) { ... }`
pub struct UpdateStrategies;

impl Operation for UpdateStrategies {
    type Variables = UpdateStrategiesVariables;
    type Response = UpdateStrategiesData;
    const NAME: &'static str = "UpdateStrategies";
    const KIND: OperationKind = OperationKind::Mutation;
    const DOCUMENT: &'static str = "mutation UpdateStrategies($strategies: [AuthenticationStrategyInput]!) { \
        authentication { updateStrategies(strategies: $strategies) { \
        responseResult { succeeded errorCode slug message } } } }";
}
