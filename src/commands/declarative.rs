//! Declarative commands
//!
//! - `plan` - Show what apply would change
//! - `apply` - Make Wiki.js match the desired state
//! - `destroy` - Remove the resources the desired state declares

use anyhow::{Result, bail};
use colored::Colorize;
use declarative::{
    Changes, ConfirmCallback, DiffSummary, ExecuteOptions, ExecuteSummary, Mode,
    ProgressCallback, ResourceDiff, ResourceState, execute_changes, group_by_type,
    pending_changes,
};

use crate::Context;
use crate::cli::{ApplyArgs, DestroyArgs};
use crate::config::DesiredState;
use crate::progress::{BarProgress, PromptConfirm};
use crate::provider::{Provider, normalize_target};
use crate::ui;

// ============================================================================
// Plan Command
// ============================================================================

pub fn plan(ctx: &Context, target: Option<&str>) -> Result<()> {
    let target = target.map(normalize_target).transpose()?;
    let (provider, state) = super::connect(ctx)?;

    ui::header("Plan");
    let plan = provider.plan(&state).filter_by_target(target.as_deref());
    preview(&pending_changes(&plan, Mode::Apply));
    Ok(())
}

// ============================================================================
// Apply Command
// ============================================================================

pub fn apply(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let target = args.target.as_deref().map(normalize_target).transpose()?;
    let (provider, state) = super::connect(ctx)?;

    ui::header("Applying Configuration");
    if args.dry_run {
        ui::warn("Dry run - no changes will be made");
    }

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.max(1),
        verbose: ctx.verbose > 0,
    };
    let summary = converge(
        &provider,
        &state,
        target.as_deref(),
        Mode::Apply,
        opts,
        &mut BarProgress::new(ctx.quiet),
        &mut PromptConfirm::new(args.yes),
    )?;
    report(&summary, args.dry_run, Mode::Apply)
}

// ============================================================================
// Destroy Command
// ============================================================================

pub fn destroy(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let target = args.target.as_deref().map(normalize_target).transpose()?;
    let (provider, state) = super::connect(ctx)?;

    ui::header("Destroying Resources");
    let opts = ExecuteOptions {
        verbose: ctx.verbose > 0,
        ..Default::default()
    };
    let summary = converge(
        &provider,
        &state,
        target.as_deref(),
        Mode::Destroy,
        opts,
        &mut BarProgress::new(ctx.quiet),
        &mut PromptConfirm::new(args.yes),
    )?;
    report(&summary, false, Mode::Destroy)
}

// ============================================================================
// Shared Flow
// ============================================================================

/// Preview the changes, then run them through the executor
fn converge<P, C>(
    provider: &Provider,
    state: &DesiredState,
    target: Option<&str>,
    mode: Mode,
    opts: ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let plan = provider.plan(state).filter_by_target(target);
    if plan.is_empty() {
        ui::info("Nothing declared for this target");
        return Ok(ExecuteSummary::default());
    }

    let changes = pending_changes(&plan, mode);
    preview(&changes);
    execute_changes(&plan, changes, &opts, mode, progress, confirm)
}

/// Print the pending changes grouped by resource type; returns their count
fn preview(changes: &Changes) -> usize {
    let Changes { diffs, errors } = changes;

    for (id, error) in errors {
        ui::error(&format!("Cannot read {id}: {error:#}"));
    }

    if diffs.is_empty() {
        if errors.is_empty() {
            ui::success("No changes. Wiki.js matches the desired state.");
        }
        return 0;
    }

    for (resource_type, diffs) in group_by_type(diffs) {
        ui::section(&resource_type);
        for diff in diffs {
            show_diff(diff);
        }
    }

    let summary = DiffSummary::from_diffs(diffs);
    println!();
    println!(
        "Plan: {} to add, {} to change, {} to remove",
        summary.additions.to_string().green(),
        summary.modifications.to_string().yellow(),
        summary.removals.to_string().red()
    );
    summary.total()
}

fn show_diff(diff: &ResourceDiff) {
    let (symbol, name) = if diff.is_addition() {
        ("+".green(), diff.resource_id.green())
    } else if diff.is_removal() {
        ("-".red(), diff.resource_id.red())
    } else {
        ("~".yellow(), diff.resource_id.yellow())
    };
    println!("  {} {} {}", symbol, name.bold(), diff.description.dimmed());

    let current = details(&diff.current);
    let desired = details(&diff.desired);
    let diff_text = similar::TextDiff::from_lines(&current, &desired);
    for change in diff_text.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => print!("      {}", format!("- {change}").red()),
            similar::ChangeTag::Insert => print!("      {}", format!("+ {change}").green()),
            similar::ChangeTag::Equal => {}
        }
    }
}

/// Rendered attributes of a state, each line newline-terminated
fn details(state: &ResourceState) -> String {
    match state {
        ResourceState::Present { details: Some(d) } => {
            let mut text = d.clone();
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text
        }
        ResourceState::Modified { to, .. } => format!("{to}\n"),
        _ => String::new(),
    }
}

fn report(summary: &ExecuteSummary, dry_run: bool, mode: Mode) -> Result<()> {
    for diagnostic in summary.diagnostics.iter() {
        ui::warn(&diagnostic.summary);
        if !diagnostic.detail.is_empty() {
            ui::dim(&format!("  {}", diagnostic.detail));
        }
    }

    println!();
    if dry_run {
        ui::info(&format!(
            "Dry run: {} resources would change",
            summary.skipped
        ));
    } else if summary.total_changes() > 0 {
        let verb = match mode {
            Mode::Apply => "Apply",
            Mode::Destroy => "Destroy",
        };
        ui::success(&format!(
            "{verb} complete: {} created, {} modified, {} removed",
            summary.created, summary.modified, summary.removed
        ));
    } else if summary.skipped > 0 {
        ui::info(&format!("Skipped {} resources", summary.skipped));
    }

    if !summary.is_success() {
        bail!("{} resources failed", summary.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthenticationConfig, GroupConfig, StrategyConfig};
    use crate::testing::FakeWiki;
    use declarative::{AutoConfirm, AutoDecline, NoProgress};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn group(name: &str, permissions: &[&str]) -> GroupConfig {
        GroupConfig {
            name: name.to_string(),
            id: None,
            redirect_on_login: "/".to_string(),
            permissions: permissions.iter().map(ToString::to_string).collect(),
            page_rules: vec![],
        }
    }

    fn ldap_bundle() -> AuthenticationConfig {
        AuthenticationConfig {
            name: "corp".to_string(),
            strategies: vec![StrategyConfig {
                key: "corp-ldap".to_string(),
                strategy_key: "ldap".to_string(),
                display_name: "Corporate".to_string(),
                order: 1,
                is_enabled: true,
                self_registration: false,
                domain_whitelist: vec![],
                auto_enroll_groups: vec![],
                config: BTreeMap::from([("url".to_string(), json!("ldap://corp"))]),
            }],
        }
    }

    fn state() -> DesiredState {
        DesiredState {
            groups: vec![group("editors", &["read:pages", "write:pages"]), group("viewers", &[])],
            authentications: vec![ldap_bundle()],
            ..Default::default()
        }
    }

    fn wiki() -> (FakeWiki, Provider) {
        let wiki = FakeWiki::new();
        wiki.seed_catalog();
        wiki.seed_active("local", "local");
        let provider = Provider::with_client(wiki.client());
        (wiki, provider)
    }

    fn run(
        provider: &Provider,
        state: &DesiredState,
        target: Option<&str>,
        mode: Mode,
        opts: ExecuteOptions,
    ) -> ExecuteSummary {
        converge(provider, state, target, mode, opts, &mut NoProgress, &mut AutoConfirm).unwrap()
    }

    #[test]
    fn test_apply_then_converged() {
        let (wiki, provider) = wiki();
        let state = state();

        let summary = run(&provider, &state, None, Mode::Apply, ExecuteOptions::default());
        assert!(summary.is_success());
        assert_eq!(summary.created, 3);
        assert_eq!(wiki.active_keys(), vec!["local", "corp-ldap"]);

        let plan = provider.plan(&state);
        assert_eq!(preview(&pending_changes(&plan, Mode::Apply)), 0);

        let again = run(&provider, &state, None, Mode::Apply, ExecuteOptions::default());
        assert_eq!(again.total_changes(), 0);
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let (wiki, provider) = wiki();
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };

        let summary = run(&provider, &state(), None, Mode::Apply, opts);
        assert_eq!(summary.skipped, 3);
        assert_eq!(wiki.calls_for("CreateGroup"), 0);
        assert_eq!(wiki.calls_for("UpdateStrategies"), 0);
        assert!(report(&summary, true, Mode::Apply).is_ok());
    }

    #[test]
    fn test_declined_confirmation_skips() {
        let (wiki, provider) = wiki();
        let summary = converge(
            &provider,
            &state(),
            None,
            Mode::Apply,
            ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();
        assert_eq!(summary.skipped, 3);
        assert_eq!(wiki.calls_for("CreateGroup"), 0);
    }

    #[test]
    fn test_target_limits_apply() {
        let (wiki, provider) = wiki();
        let summary = run(
            &provider,
            &state(),
            Some("group.viewers"),
            Mode::Apply,
            ExecuteOptions::default(),
        );
        assert_eq!(summary.created, 1);
        assert_eq!(wiki.calls_for("CreateGroup"), 1);
        assert_eq!(wiki.calls_for("UpdateStrategies"), 0);
    }

    #[test]
    fn test_empty_target_is_noop() {
        let (wiki, provider) = wiki();
        let summary = run(
            &provider,
            &state(),
            Some("group.missing"),
            Mode::Apply,
            ExecuteOptions::default(),
        );
        assert_eq!(summary.total(), 0);
        assert_eq!(wiki.call_count(), 0);
    }

    #[test]
    fn test_modification_preview() {
        let (wiki, provider) = wiki();
        wiki.seed_group("editors", &["read:pages"]);
        let state = DesiredState {
            groups: vec![group("editors", &["read:pages", "write:pages"])],
            ..Default::default()
        };

        assert_eq!(preview(&pending_changes(&provider.plan(&state), Mode::Apply)), 1);
        let summary = run(&provider, &state, None, Mode::Apply, ExecuteOptions::default());
        assert_eq!(summary.modified, 1);
    }

    #[test]
    fn test_destroy_keeps_unmanaged() {
        let (wiki, provider) = wiki();
        let state = state();
        run(&provider, &state, None, Mode::Apply, ExecuteOptions::default());
        let unmanaged = wiki.seed_group("admins", &[]);

        let summary = run(&provider, &state, None, Mode::Destroy, ExecuteOptions::default());
        assert_eq!(summary.removed, 3);
        assert!(wiki.group(unmanaged).is_some());
        assert_eq!(wiki.active_keys(), vec!["local"]);

        let again = run(&provider, &state, None, Mode::Destroy, ExecuteOptions::default());
        assert_eq!(again.total(), 0);
    }

    #[test]
    fn test_failure_is_reported_as_error() {
        let (wiki, provider) = wiki();
        wiki.fail("CreateGroup", "Forbidden");
        let state = DesiredState {
            groups: vec![group("editors", &[])],
            ..Default::default()
        };

        let summary = run(&provider, &state, None, Mode::Apply, ExecuteOptions::default());
        assert_eq!(summary.failed, 1);
        let err = report(&summary, false, Mode::Apply).unwrap_err();
        assert!(err.to_string().contains("1 resources failed"));
    }

    #[test]
    fn test_details_terminates_lines() {
        let state = ResourceState::Present {
            details: Some("name = editors".to_string()),
        };
        assert_eq!(details(&state), "name = editors\n");
        assert_eq!(details(&ResourceState::Absent), "");
    }

    #[test]
    fn test_permissions_set_unchanged() {
        let (wiki, provider) = wiki();
        wiki.seed_group("editors", &["write:pages", "read:pages"]);
        let state = DesiredState {
            groups: vec![group("editors", &["read:pages", "write:pages"])],
            ..Default::default()
        };
        assert_eq!(preview(&pending_changes(&provider.plan(&state), Mode::Apply)), 0);
    }

    #[test]
    fn test_preview_reuses_remote_reads() {
        let (wiki, provider) = wiki();
        let state = DesiredState {
            groups: vec![group("editors", &[])],
            ..Default::default()
        };

        let summary = run(&provider, &state, None, Mode::Apply, ExecuteOptions::default());
        assert_eq!(summary.created, 1);
        // One lookup for the preview, one inside apply
        assert_eq!(wiki.calls_for("ListGroups"), 2);
    }

    #[test]
    fn test_alias_target_applies() {
        let (wiki, provider) = wiki();
        let target = normalize_target("groups.viewers").unwrap();
        let summary = run(
            &provider,
            &state(),
            Some(&target),
            Mode::Apply,
            ExecuteOptions::default(),
        );
        assert_eq!(summary.created, 1);
        assert_eq!(wiki.calls_for("CreateGroup"), 1);
    }
}
