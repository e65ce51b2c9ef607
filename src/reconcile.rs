//! One reconciliation pass: resolve, fetch, plan, execute

use crate::engine::{self, ExecuteOptions, ExecuteSummary, PlanStats, TagPolicy};
use crate::error::AutotagError;
use crate::resolver::resolve_network;
use dashboard::{Backend, DEVICE_FIELDS};

/// What to reconcile and how
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub org_name: String,
    pub network_name: String,
    pub policy: TagPolicy,
    pub prune_wrong_tags: bool,
    pub dry_run: bool,
}

/// Outcome of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub network_id: String,
    pub plan: PlanStats,
    pub execution: ExecuteSummary,
}

impl RunSummary {
    /// Log the summary lines
    pub fn log(&self) {
        let verb = if self.execution.dry_run {
            "would be"
        } else {
            "were"
        };
        log::info!(
            "{} devices seen, {} already correct, {} skipped without an id",
            self.plan.devices,
            self.plan.already_correct,
            self.plan.skipped
        );
        log::info!(
            "{} tag changes ({} additions, {} removals) {} submitted in {} batches",
            self.execution.total_changes(),
            self.execution.added,
            self.execution.removed,
            verb,
            self.execution.batches
        );
    }
}

/// Run one pass against `backend`.
///
/// Nothing is mutated before the network is resolved and the full device
/// list is fetched.
pub fn run(backend: &dyn Backend, opts: &RunOptions) -> Result<RunSummary, AutotagError> {
    let network_id = resolve_network(backend, &opts.org_name, &opts.network_name)?;
    log::info!(
        "Resolved network name {} to ID: {}",
        opts.network_name,
        network_id
    );

    let devices = backend.list_managed_devices(&network_id, DEVICE_FIELDS)?;
    log::info!("Total Systems Manager devices retrieved: {}", devices.len());

    let plan = engine::plan(&devices, &opts.policy, opts.prune_wrong_tags);
    if plan.is_empty() {
        log::info!("All devices are correctly tagged");
    }

    let execution = engine::execute(
        backend,
        &network_id,
        &plan,
        &opts.policy,
        &ExecuteOptions {
            dry_run: opts.dry_run,
        },
    )?;

    Ok(RunSummary {
        network_id,
        plan: plan.stats,
        execution,
    })
}
