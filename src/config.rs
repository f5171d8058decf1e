//! Desired-state file: provider settings plus the groups and authentication
//! bundles to converge.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use wikijs::PageRule;

/// File looked up in the working directory when no path is given.
pub const LOCAL_FILE: &str = "wikijs.toml";

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("wikijs-sync"))
}

// ============================================================================
// Desired State
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesiredState {
    #[serde(default)]
    pub provider: ProviderBlock,
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupConfig>,
    #[serde(default, rename = "authentication")]
    pub authentications: Vec<AuthenticationConfig>,
}

/// `[provider]` block. Both values may also come from flags or the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBlock {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    /// Pin the group to a remote id instead of resolving it by name.
    #[serde(default)]
    pub id: Option<i32>,
    pub redirect_on_login: String,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub page_rules: Vec<PageRule>,
}

/// A named bundle of active authentication strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationConfig {
    pub name: String,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Instance key, unique across the wiki.
    pub key: String,
    /// Catalog module the instance runs, e.g. `local` or `ldap`.
    pub strategy_key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    #[serde(default)]
    pub self_registration: bool,
    #[serde(default)]
    pub domain_whitelist: Vec<String>,
    #[serde(default)]
    pub auto_enroll_groups: Vec<i32>,
    #[serde(default)]
    pub config: BTreeMap<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl DesiredState {
    /// Load the desired state from `path`, or from the default locations.
    ///
    /// An explicit path must exist. Without one, `./wikijs.toml` and then
    /// `~/.config/wikijs-sync/config.toml` are tried; if neither exists the
    /// state is empty.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match locate(path)? {
            Some(path) => Self::load_from(&path),
            None => {
                log::debug!("No desired-state file found, using an empty state");
                Ok(Self::default())
            }
        }
    }

    /// Load and validate a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid desired-state file {}", path.display()))?;
        state
            .validate()
            .with_context(|| format!("Invalid desired-state file {}", path.display()))?;
        log::debug!(
            "Loaded {} group(s) and {} authentication bundle(s) from {}",
            state.groups.len(),
            state.authentications.len(),
            path.display()
        );
        Ok(state)
    }

    /// Structural checks that need no remote data.
    pub fn validate(&self) -> Result<()> {
        let mut names = BTreeSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                bail!("group name must not be empty");
            }
            if !names.insert(group.name.as_str()) {
                bail!("group \"{}\" is declared more than once", group.name);
            }
        }

        let mut bundles = BTreeSet::new();
        let mut keys = BTreeMap::new();
        for auth in &self.authentications {
            if !bundles.insert(auth.name.as_str()) {
                bail!("authentication \"{}\" is declared more than once", auth.name);
            }
            if auth.strategies.is_empty() {
                bail!("authentication \"{}\" declares no strategies", auth.name);
            }
            for strategy in &auth.strategies {
                if let Some(owner) = keys.insert(strategy.key.as_str(), auth.name.as_str()) {
                    bail!(
                        "strategy key \"{}\" is used by both \"{}\" and \"{}\"",
                        strategy.key,
                        owner,
                        auth.name
                    );
                }
            }
        }

        Ok(())
    }
}

/// Resolve which desired-state file to read, if any
fn locate(path: Option<&str>) -> Result<Option<PathBuf>> {
    if let Some(path) = path {
        let expanded = PathBuf::from(shellexpand::tilde(path).as_ref());
        if !expanded.exists() {
            bail!("Desired-state file not found: {}", expanded.display());
        }
        return Ok(Some(expanded));
    }

    let local = PathBuf::from(LOCAL_FILE);
    if local.exists() {
        return Ok(Some(local));
    }

    let global = config_dir()?.join("config.toml");
    Ok(global.exists().then_some(global))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wikijs::PageRuleMatch;

    const SAMPLE: &str = r#"
[provider]
host = "https://wiki.example.com/graphql"

[[group]]
name = "test-group"
redirect_on_login = "/"
permissions = ["write:pages", "read:pages"]

[[group.page_rules]]
id = "r1"
match = "START"
roles = ["read:pages"]
path = "test"

[[group]]
name = "readers"
id = 4
redirect_on_login = "/home"

[[authentication]]
name = "corp"

[[authentication.strategies]]
key = "ldap-corp"
strategy_key = "ldap"
display_name = "Corporate LDAP"
auto_enroll_groups = [4]
config = { url = "ldap://ldap.example.com", tlsEnabled = "true" }
"#;

    fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("wikijs.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_sample() {
        let dir = TempDir::new().unwrap();
        let state = DesiredState::load_from(&write(&dir, SAMPLE)).unwrap();

        assert_eq!(
            state.provider.host.as_deref(),
            Some("https://wiki.example.com/graphql")
        );
        assert!(state.provider.token.is_none());

        let group = &state.groups[0];
        assert_eq!(group.name, "test-group");
        assert_eq!(group.redirect_on_login, "/");
        assert!(group.id.is_none());
        assert_eq!(group.page_rules[0].match_mode, PageRuleMatch::Start);
        assert!(!group.page_rules[0].deny);
        assert!(group.page_rules[0].locales.is_empty());
        assert_eq!(state.groups[1].id, Some(4));

        let strategy = &state.authentications[0].strategies[0];
        assert!(strategy.is_enabled);
        assert_eq!(strategy.order, 0);
        assert_eq!(strategy.auto_enroll_groups, vec![4]);
        assert_eq!(strategy.config["tlsEnabled"], Value::String("true".to_string()));
    }

    #[test]
    fn test_permissions_are_a_set() {
        let dir = TempDir::new().unwrap();
        let state = DesiredState::load_from(&write(&dir, SAMPLE)).unwrap();
        let permissions: Vec<_> = state.groups[0].permissions.iter().cloned().collect();
        assert_eq!(permissions, vec!["read:pages", "write:pages"]);
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let dir = TempDir::new().unwrap();
        let entry = "[[group]]\nname = \"a\"\nredirect_on_login = \"/\"\n";
        let path = write(&dir, &format!("{entry}\n{entry}"));
        let err = DesiredState::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("more than once"));
    }

    #[test]
    fn test_shared_strategy_key_rejected() {
        let state = DesiredState {
            authentications: vec![
                AuthenticationConfig {
                    name: "a".to_string(),
                    strategies: vec![strategy("local")],
                },
                AuthenticationConfig {
                    name: "b".to_string(),
                    strategies: vec![strategy("local")],
                },
            ],
            ..Default::default()
        };
        let err = state.validate().unwrap_err();
        assert!(err.to_string().contains("\"local\""));
    }

    #[test]
    fn test_empty_bundle_rejected() {
        let state = DesiredState {
            authentications: vec![AuthenticationConfig {
                name: "a".to_string(),
                strategies: vec![],
            }],
            ..Default::default()
        };
        assert!(state.validate().is_err());
    }

    #[test]
    fn test_group_requires_redirect() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[[group]]\nname = \"editors\"\n");
        let err = DesiredState::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("redirect_on_login"));
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(DesiredState::load(missing.to_str()).is_err());
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "[[group]\nname = ");
        let err = DesiredState::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("wikijs.toml"));
    }

    fn strategy(key: &str) -> StrategyConfig {
        StrategyConfig {
            key: key.to_string(),
            strategy_key: key.to_string(),
            display_name: String::new(),
            order: 0,
            is_enabled: true,
            self_registration: false,
            domain_whitelist: vec![],
            auto_enroll_groups: vec![],
            config: BTreeMap::new(),
        }
    }
}
