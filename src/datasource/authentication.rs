//! Authentication catalog data source - the strategy modules Wiki.js offers

use std::collections::BTreeMap;
use std::sync::Arc;
use wikijs::{AuthenticationStrategy, Client, Result, StrategyProperty};

/// A catalog module with its property descriptors decoded
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub strategy: AuthenticationStrategy,
    pub properties: BTreeMap<String, StrategyProperty>,
}

impl CatalogEntry {
    /// Properties in the order Wiki.js shows them
    pub fn ordered_properties(&self) -> Vec<(&str, &StrategyProperty)> {
        let mut props: Vec<_> = self
            .properties
            .iter()
            .map(|(key, prop)| (key.as_str(), prop))
            .collect();
        props.sort_by_key(|(key, prop)| (prop.order, *key));
        props
    }
}

/// One read of the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogData {
    pub id: String,
    pub entries: Vec<CatalogEntry>,
}

pub struct StrategyCatalog {
    client: Arc<Client>,
}

impl StrategyCatalog {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Read the catalog; an undecodable descriptor fails the whole read
    pub fn read(&self) -> Result<CatalogData> {
        let entries = self
            .client
            .strategies()?
            .into_iter()
            .map(|strategy| {
                let properties = strategy.properties()?;
                Ok(CatalogEntry {
                    strategy,
                    properties,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CatalogData {
            id: super::read_id(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWiki;
    use wikijs::PropertyType;

    #[test]
    fn test_read_catalog() {
        let wiki = FakeWiki::new();
        wiki.seed_catalog();
        let catalog = StrategyCatalog::new(Arc::new(wiki.client())).read().unwrap();

        assert!(!catalog.id.is_empty());
        assert_eq!(catalog.entries.len(), 2);
        let ldap = catalog.entries.iter().find(|e| e.strategy.key == "ldap").unwrap();
        assert_eq!(ldap.properties["tlsEnabled"].property_type, PropertyType::Boolean);

        let order: Vec<&str> = ldap.ordered_properties().iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec!["url", "tlsEnabled", "port", "mode"]);
    }

    #[test]
    fn test_empty_catalog() {
        let wiki = FakeWiki::new();
        let catalog = StrategyCatalog::new(Arc::new(wiki.client())).read().unwrap();
        assert!(catalog.entries.is_empty());
    }
}
