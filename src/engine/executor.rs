//! Batch mutation executor - applies the plan against the Dashboard

use dashboard::{Backend, MAX_TAG_BATCH, TagAction};

use super::classify::TagPolicy;
use super::planner::ActionPlan;

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Log what would be sent, but submit nothing
    pub dry_run: bool,
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    /// Device-tag additions submitted (or planned, in a dry run)
    pub added: usize,
    /// Device-tag removals submitted (or planned, in a dry run)
    pub removed: usize,
    /// Mutation calls made
    pub batches: usize,
    pub dry_run: bool,
}

impl ExecuteSummary {
    pub fn total_changes(&self) -> usize {
        self.added + self.removed
    }
}

/// Apply one tag action to `ids`, at most [`MAX_TAG_BATCH`] devices per call.
///
/// Batches go out sequentially in queue order. The first failure is
/// returned as-is; batches already sent stay applied. Returns the number
/// of calls made.
pub fn apply_tag_action(
    backend: &dyn Backend,
    network_id: &str,
    ids: &[String],
    tag: &str,
    action: TagAction,
) -> dashboard::Result<usize> {
    let tags = [tag.to_string()];
    let total = ids.len().div_ceil(MAX_TAG_BATCH);

    for (index, batch) in ids.chunks(MAX_TAG_BATCH).enumerate() {
        log::info!(
            "Submitting batch {}/{}: {} '{}' on {} devices",
            index + 1,
            total,
            action,
            tag,
            batch.len()
        );
        backend.modify_device_tags(network_id, batch, &tags, action)?;
    }

    Ok(total)
}

/// Execute every non-empty queue of the plan, in plan order.
pub fn execute(
    backend: &dyn Backend,
    network_id: &str,
    plan: &ActionPlan,
    policy: &TagPolicy,
    opts: &ExecuteOptions,
) -> dashboard::Result<ExecuteSummary> {
    let mut summary = ExecuteSummary {
        dry_run: opts.dry_run,
        ..ExecuteSummary::default()
    };

    for step in plan.steps(policy) {
        if step.ids.is_empty() {
            continue;
        }

        match step.action {
            TagAction::Add => log::info!(
                "Tagging {} devices with '{}'",
                step.ids.len(),
                step.tag
            ),
            TagAction::Remove => log::info!(
                "Removing '{}' from {} devices that are not {}",
                step.tag,
                step.ids.len(),
                step.capability
            ),
        }

        if opts.dry_run {
            log::info!("Dry run: not submitting {:?}", step.ids);
        } else {
            summary.batches +=
                apply_tag_action(backend, network_id, step.ids, step.tag, step.action)?;
        }

        match step.action {
            TagAction::Add => summary.added += step.ids.len(),
            TagAction::Remove => summary.removed += step.ids.len(),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::planner::plan;
    use dashboard::{DeviceSnapshot, MockBackend};

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("D{i:03}")).collect()
    }

    #[test]
    fn batches_of_twenty() {
        let mock = MockBackend::new();
        let queue = ids(45);

        let calls = apply_tag_action(&mock, "N_1", &queue, "Store_Ipad", TagAction::Add).unwrap();

        let recorded = mock.tag_calls();
        assert_eq!(calls, 3);
        let sizes: Vec<_> = recorded.iter().map(|c| c.ids.len()).collect();
        assert_eq!(sizes, vec![20, 20, 5]);

        let resent: Vec<String> = recorded.iter().flat_map(|c| c.ids.clone()).collect();
        assert_eq!(resent, queue);
        for call in &recorded {
            assert_eq!(call.network_id, "N_1");
            assert_eq!(call.tags, vec!["Store_Ipad".to_string()]);
            assert_eq!(call.action, TagAction::Add);
        }
    }

    #[test]
    fn call_count_is_ceiling_of_batches() {
        for count in [1, 19, 20, 21, 40, 41, 100] {
            let mock = MockBackend::new();
            let calls =
                apply_tag_action(&mock, "N_1", &ids(count), "Tag", TagAction::Remove).unwrap();
            assert_eq!(calls, count.div_ceil(20), "{count} ids");
            assert_eq!(mock.tag_calls().len(), calls);
            assert!(mock.tag_calls().iter().all(|c| c.ids.len() <= 20));
        }
    }

    #[test]
    fn empty_queue_makes_no_calls() {
        let mock = MockBackend::new();
        let calls = apply_tag_action(&mock, "N_1", &[], "Store_Ipad", TagAction::Add).unwrap();
        assert_eq!(calls, 0);
        assert!(mock.tag_calls().is_empty());
    }

    #[test]
    fn failure_stops_remaining_batches() {
        let mock = MockBackend::new();
        mock.fail_tag_call(1);

        let err = apply_tag_action(&mock, "N_1", &ids(60), "Store_Ipad", TagAction::Add)
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        // First batch went through, second failed, third never sent
        assert_eq!(mock.tag_calls().len(), 2);
    }

    #[test]
    fn execute_runs_queues_in_order() {
        let mock = MockBackend::new();
        let policy = TagPolicy::default();
        let devices = vec![
            DeviceSnapshot::new("D1").imei("123").tags(["Curbside_iPad"]),
            DeviceSnapshot::new("D2").tags(["Store_Ipad"]),
        ];
        let plan = plan(&devices, &policy, true);

        let summary = execute(&mock, "N_1", &plan, &policy, &ExecuteOptions::default()).unwrap();

        let order: Vec<_> = mock
            .tag_calls()
            .into_iter()
            .map(|c| (c.action, c.tags[0].clone(), c.ids))
            .collect();
        assert_eq!(
            order,
            vec![
                (TagAction::Add, "Store_Ipad".to_string(), vec!["D1".to_string()]),
                (TagAction::Add, "Curbside_iPad".to_string(), vec!["D2".to_string()]),
                (TagAction::Remove, "Store_Ipad".to_string(), vec!["D2".to_string()]),
                (TagAction::Remove, "Curbside_iPad".to_string(), vec!["D1".to_string()]),
            ]
        );
        assert_eq!(summary.added, 2);
        assert_eq!(summary.removed, 2);
        assert_eq!(summary.batches, 4);
    }

    #[test]
    fn execute_skips_empty_queues() {
        let mock = MockBackend::new();
        let policy = TagPolicy::default();
        let plan = plan(&[DeviceSnapshot::new("D1")], &policy, true);

        let summary = execute(&mock, "N_1", &plan, &policy, &ExecuteOptions::default()).unwrap();

        assert_eq!(mock.tag_calls().len(), 1);
        assert_eq!(summary.batches, 1);
        assert_eq!(summary.total_changes(), 1);
    }

    #[test]
    fn dry_run_submits_nothing() {
        let mock = MockBackend::new();
        let policy = TagPolicy::default();
        let plan = plan(&[DeviceSnapshot::new("D1").imei("1")], &policy, false);

        let summary =
            execute(&mock, "N_1", &plan, &policy, &ExecuteOptions { dry_run: true }).unwrap();

        assert!(mock.tag_calls().is_empty());
        assert!(summary.dry_run);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.batches, 0);
    }
}
