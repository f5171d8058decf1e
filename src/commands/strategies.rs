use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use std::collections::BTreeMap;

use crate::Context;
use crate::datasource::CatalogEntry;
use crate::provider::Provider;
use crate::ui;

pub fn run(ctx: &Context, key: Option<&str>) -> Result<()> {
    let (provider, _) = super::connect(ctx)?;
    show(&provider, key)
}

fn show(provider: &Provider, key: Option<&str>) -> Result<()> {
    let catalog = provider
        .strategy_catalog()
        .read()
        .context("Failed to read the strategy catalog")?;
    let active = provider
        .authentications()
        .active()
        .context("Failed to read active strategies")?;

    let mut instances: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for a in &active {
        instances
            .entry(a.strategy.key.as_str())
            .or_default()
            .push(a.key.as_str());
    }

    match key {
        Some(key) => {
            let Some(entry) = catalog.entries.iter().find(|e| e.strategy.key == key) else {
                bail!("No strategy module \"{key}\" in the catalog");
            };
            show_module(entry, instances.get(key).map_or(&[][..], Vec::as_slice));
        }
        None => {
            ui::header("Authentication Strategies");
            for entry in &catalog.entries {
                let strategy = &entry.strategy;
                let status = if strategy.is_available {
                    "●".green()
                } else {
                    "○".dimmed()
                };
                let in_use = instances
                    .get(strategy.key.as_str())
                    .map(|keys| format!(" [{}]", keys.join(", ")).cyan().to_string())
                    .unwrap_or_default();
                println!(
                    "  {} {:<24} {}{}",
                    status,
                    strategy.key,
                    strategy.title.dimmed(),
                    in_use
                );
            }
            println!();
            ui::dim(&format!(
                "{} modules, {} active instances",
                catalog.entries.len(),
                active.len()
            ));
        }
    }

    Ok(())
}

fn show_module(entry: &CatalogEntry, instances: &[&str]) {
    let strategy = &entry.strategy;
    ui::header(&format!("{} ({})", strategy.title, strategy.key));
    if !strategy.description.is_empty() {
        ui::dim(&strategy.description);
    }
    ui::kv("Available", &ui::flag(strategy.is_available));
    ui::kv("Login form", &ui::flag(strategy.use_form));
    if !strategy.website.is_empty() {
        ui::kv("Website", &strategy.website);
    }
    ui::kv("Instances", &ui::list(instances));

    ui::section("Properties");
    if entry.properties.is_empty() {
        ui::dim("(none)");
        return;
    }
    for (name, prop) in entry.ordered_properties() {
        let mut line = format!("{name}: {}", prop.property_type);
        if !prop.default.is_null() {
            line.push_str(&format!(" = {}", prop.default));
        }
        if let Some(allowed) = prop.allowed_values() {
            line.push_str(&format!(" (one of {})", ui::list(allowed)));
        }
        if prop.sensitive {
            line.push_str(" [sensitive]");
        }
        println!("  {}", line);
        if !prop.hint.is_empty() {
            ui::dim(&format!("  {}", prop.hint));
        }
    }
}
