use anyhow::{Context as AnyhowContext, Result};

use crate::Context;
use crate::provider::Provider;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let (provider, _) = super::connect(ctx)?;
    show(&provider)
}

fn show(provider: &Provider) -> Result<()> {
    let site = provider
        .site()
        .read()
        .context("Failed to read site settings")?;

    ui::header("Wiki.js Site");
    ui::kv("Title", &site.title);
    ui::kv("Host", &site.host);
    if !site.description.is_empty() {
        ui::kv("Description", &site.description);
    }
    ui::kv("Read at", &site.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWiki;

    #[test]
    fn test_show_reads_site_once() {
        let wiki = FakeWiki::new();
        show(&Provider::with_client(wiki.client())).unwrap();
        assert_eq!(wiki.calls_for("GetSite"), 1);
    }

    #[test]
    fn test_show_propagates_failure() {
        let wiki = FakeWiki::new();
        wiki.fail("GetSite", "Forbidden");
        let err = show(&Provider::with_client(wiki.client())).unwrap_err();
        assert!(format!("{err:#}").contains("Forbidden"));
    }
}
