use anyhow::{Context as AnyhowContext, Result, bail};
use colored::Colorize;
use declarative::ConfirmCallback;

use crate::Context;
use crate::cli::GroupCommand;
use crate::progress::PromptConfirm;
use crate::provider::Provider;
use crate::resource::GroupData;
use crate::ui;

pub fn run(ctx: &Context, cmd: GroupCommand) -> Result<()> {
    let (provider, _) = super::connect(ctx)?;
    match cmd {
        GroupCommand::List => list(&provider),
        GroupCommand::Get { id } => get(&provider, id),
        GroupCommand::Delete { id, yes } => delete(&provider, id, &mut PromptConfirm::new(yes)),
    }
}

fn list(provider: &Provider) -> Result<()> {
    let groups = provider.groups().list().context("Failed to list groups")?;

    ui::header("Groups");
    if groups.is_empty() {
        ui::dim("(none)");
        return Ok(());
    }

    println!(
        "  {:>4}  {:<32} {:>6}",
        "ID".dimmed(),
        "NAME".dimmed(),
        "USERS".dimmed()
    );
    for group in &groups {
        let system = if group.is_system {
            " (system)".dimmed().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:>4}  {:<32} {:>6}{}",
            group.id, group.name, group.user_count, system
        );
    }
    Ok(())
}

fn get(provider: &Provider, id: i32) -> Result<()> {
    let Some(group) = provider
        .groups()
        .get(id)
        .with_context(|| format!("Failed to read group {id}"))?
    else {
        bail!("Group {id} does not exist");
    };
    let data = GroupData::from_remote(&group);

    ui::header(&format!("Group {} ({})", data.name, data.id));
    ui::kv("System", &ui::flag(data.is_system));
    ui::kv("Redirect on login", &data.redirect_on_login);
    ui::kv("Created", &data.created_at);
    ui::kv("Updated", &data.updated_at);

    ui::section("Permissions");
    let permissions: Vec<&String> = data.permissions.iter().collect();
    ui::dim(&ui::list(&permissions));

    ui::section("Page Rules");
    if data.page_rules.is_empty() {
        ui::dim("(none)");
    }
    for rule in &data.page_rules {
        let access = if rule.deny { "deny".red() } else { "allow".green() };
        println!(
            "  {} {} {} {} {}",
            rule.id.bold(),
            access,
            rule.match_mode,
            rule.path,
            format!("roles: {}", ui::list(&rule.roles)).dimmed()
        );
        if !rule.locales.is_empty() {
            ui::dim(&format!("  locales: {}", ui::list(&rule.locales)));
        }
    }
    Ok(())
}

fn delete<C: ConfirmCallback>(provider: &Provider, id: i32, confirm: &mut C) -> Result<()> {
    let groups = provider.groups();
    let Some(group) = groups
        .get(id)
        .with_context(|| format!("Failed to read group {id}"))?
    else {
        ui::info(&format!("Group {id} does not exist"));
        return Ok(());
    };

    if !confirm.confirm(&format!("Delete group {} ({id})?", group.name))? {
        ui::info("Aborted");
        return Ok(());
    }

    let mut data = GroupData::from_remote(&group);
    groups
        .delete(&mut data)
        .with_context(|| format!("Failed to delete group {id}"))?;
    ui::success(&format!("Deleted group {} ({id})", group.name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWiki;
    use declarative::{AutoConfirm, AutoDecline};

    #[test]
    fn test_list_and_get() {
        let wiki = FakeWiki::new();
        let id = wiki.seed_group("editors", &["read:pages"]);
        let provider = Provider::with_client(wiki.client());

        list(&provider).unwrap();
        get(&provider, id).unwrap();
        assert!(get(&provider, 404).is_err());
    }

    #[test]
    fn test_delete_confirmed() {
        let wiki = FakeWiki::new();
        let id = wiki.seed_group("editors", &[]);
        let provider = Provider::with_client(wiki.client());

        delete(&provider, id, &mut AutoConfirm).unwrap();
        assert!(wiki.group(id).is_none());
    }

    #[test]
    fn test_delete_declined() {
        let wiki = FakeWiki::new();
        let id = wiki.seed_group("editors", &[]);
        let provider = Provider::with_client(wiki.client());

        delete(&provider, id, &mut AutoDecline).unwrap();
        assert!(wiki.group(id).is_some());
        assert_eq!(wiki.calls_for("DeleteGroup"), 0);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let wiki = FakeWiki::new();
        let provider = Provider::with_client(wiki.client());
        delete(&provider, 9, &mut AutoConfirm).unwrap();
        assert_eq!(wiki.calls_for("DeleteGroup"), 0);
    }
}
