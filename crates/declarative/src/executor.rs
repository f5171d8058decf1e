//! Execution engine - applies or destroys resources with parallelism

use crate::context::{ApplyContext, AutoConfirm, ConfirmCallback, NoProgress, ProgressCallback};
use crate::diagnostics::Diagnostics;
use crate::diff::{ResourceDiff, compute_destroy_diffs, compute_diffs};
use crate::planner::ExecutionPlan;
use crate::resource::{BoxedResource, Resource};
use crate::types::{ApplyResult, ExecuteOptions, ExecuteSummary};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashSet;

/// Which resource operation a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Converge to the desired state
    Apply,
    /// Remove what currently exists
    Destroy,
}

/// Diffs and read failures of a plan, computed once before it runs
#[derive(Debug, Default)]
pub struct Changes {
    /// Resources that differ from their target state
    pub diffs: Vec<ResourceDiff>,
    /// Resources whose current state could not be read
    pub errors: Vec<(String, anyhow::Error)>,
}

/// Read every resource in a plan and collect what `mode` would change
pub fn pending_changes(plan: &ExecutionPlan, mode: Mode) -> Changes {
    let (mut diffs, mut errors) = mode.diffs(&plan.parallel);
    let (seq_diffs, seq_errors) = mode.diffs(&plan.sequential);
    diffs.extend(seq_diffs);
    errors.extend(seq_errors);
    Changes { diffs, errors }
}

impl Mode {
    fn prompt(self, count: usize) -> String {
        match self {
            Self::Apply => format!("Apply {count} change(s)?"),
            Self::Destroy => format!("Destroy {count} resource(s)?"),
        }
    }

    fn diffs(self, resources: &[BoxedResource]) -> (Vec<ResourceDiff>, Vec<(String, anyhow::Error)>) {
        match self {
            Self::Apply => compute_diffs(resources),
            Self::Destroy => compute_destroy_diffs(resources),
        }
    }
}

/// Execute a plan with the given options and callbacks
///
/// Only resources whose current state differs from the desired state are
/// applied. Resources whose current state cannot be read count as failed.
///
/// # Arguments
/// * `plan` - The execution plan to run
/// * `opts` - Execution options (dry_run, jobs, verbose)
/// * `progress` - Progress callback
/// * `confirm` - Confirmation callback, skipped on dry runs
///
/// # Returns
/// Summary of execution results, including collected warnings
pub fn execute<P, C>(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let changes = pending_changes(&plan, Mode::Apply);
    execute_changes(&plan, changes, &opts, Mode::Apply, progress, confirm)
}

/// Destroy every resource in a plan that currently exists
///
/// Same flow as [`execute`], driving [`Resource::destroy`].
pub fn destroy<P, C>(
    plan: ExecutionPlan,
    opts: ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let changes = pending_changes(&plan, Mode::Destroy);
    execute_changes(&plan, changes, &opts, Mode::Destroy, progress, confirm)
}

/// Simple execution without callbacks
///
/// For basic use cases where you don't need progress or confirmation.
pub fn execute_simple(plan: ExecutionPlan, opts: ExecuteOptions) -> Result<ExecuteSummary> {
    execute(plan, opts, &mut NoProgress, &mut AutoConfirm)
}

/// Run the resources named by `changes`, computed from `plan` by
/// [`pending_changes`].
///
/// Lets a caller show the changes before running them without reading
/// every resource twice. Unreadable resources count as failed.
pub fn execute_changes<P, C>(
    plan: &ExecutionPlan,
    changes: Changes,
    opts: &ExecuteOptions,
    mode: Mode,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteSummary>
where
    P: ProgressCallback,
    C: ConfirmCallback,
{
    let mut summary = ExecuteSummary::default();
    let Changes { diffs, errors } = changes;

    for (id, error) in errors {
        let result = ApplyResult::Failed {
            error: format!("{error:#}"),
        };
        progress.on_resource_complete(&id, &result);
        summary.add_result(&result);
    }

    if diffs.is_empty() {
        return Ok(summary);
    }

    if opts.dry_run {
        summary.skipped += diffs.len();
        return Ok(summary);
    }

    if !confirm.confirm(&mode.prompt(diffs.len()))? {
        summary.skipped += diffs.len();
        return Ok(summary);
    }

    let changed: HashSet<(String, String)> = diffs
        .iter()
        .map(|d| (d.resource_type.clone(), d.resource_id.clone()))
        .collect();
    let parallel = pending(&plan.parallel, &changed);
    if !parallel.is_empty() {
        progress.on_batch_start(parallel.len());
        summary.merge(execute_batch(&parallel, opts.jobs, opts.verbose, mode, progress)?);
        progress.on_batch_complete();
    }

    let sequential = pending(&plan.sequential, &changed);
    if !sequential.is_empty() {
        progress.on_batch_start(sequential.len());
        summary.merge(execute_batch(&sequential, 1, opts.verbose, mode, progress)?);
        progress.on_batch_complete();
    }

    Ok(summary)
}

/// Resources that appear in the computed diffs
fn pending<'a>(
    resources: &'a [BoxedResource],
    changed: &HashSet<(String, String)>,
) -> Vec<&'a dyn Resource> {
    resources
        .iter()
        .filter(|r| changed.contains(&(r.resource_type().to_string(), r.id())))
        .map(|r| r.as_ref())
        .collect()
}

/// Execute a batch of resources
fn execute_batch<P: ProgressCallback>(
    resources: &[&dyn Resource],
    jobs: usize,
    verbose: bool,
    mode: Mode,
    progress: &mut P,
) -> Result<ExecuteSummary> {
    let mut summary = ExecuteSummary::default();

    if jobs <= 1 || resources.len() == 1 {
        // Sequential execution
        for resource in resources {
            progress.on_resource_start(&resource.id(), &resource.description());
            let (result, diagnostics) = apply_resource(*resource, verbose, mode);
            progress.on_resource_complete(&resource.id(), &result);
            summary.add_result(&result);
            summary.diagnostics.extend(diagnostics);
        }
        return Ok(summary);
    }

    // Parallel execution; progress is reported once the pool is done
    // because the callback is not thread-safe.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

    let outcomes: Vec<(String, ApplyResult, Diagnostics)> = pool.install(|| {
        resources
            .par_iter()
            .map(|resource| {
                let (result, diagnostics) = apply_resource(*resource, verbose, mode);
                (resource.id(), result, diagnostics)
            })
            .collect()
    });

    for (id, result, diagnostics) in outcomes {
        progress.on_resource_complete(&id, &result);
        summary.add_result(&result);
        summary.diagnostics.extend(diagnostics);
    }

    Ok(summary)
}

/// Apply or destroy a single resource
fn apply_resource(resource: &dyn Resource, verbose: bool, mode: Mode) -> (ApplyResult, Diagnostics) {
    let mut ctx = ApplyContext::new(false, verbose);

    let outcome = match mode {
        Mode::Apply => resource.apply(&mut ctx),
        Mode::Destroy => resource.destroy(&mut ctx),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    };

    (result, ctx.take_diagnostics())
}
