//! Site data source - host, title and description of the wiki

use std::sync::Arc;
use wikijs::{Client, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteData {
    pub id: String,
    pub host: String,
    pub title: String,
    pub description: String,
}

pub struct SiteDataSource {
    client: Arc<Client>,
}

impl SiteDataSource {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub fn read(&self) -> Result<SiteData> {
        let site = self.client.site()?;
        Ok(SiteData {
            id: super::read_id(),
            host: site.host,
            title: site.title,
            description: site.description,
        })
    }
}
