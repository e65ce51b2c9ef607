//! Reconciliation planner - decides which tags to add and remove

use super::classify::{Capability, TagPolicy, classify};
use dashboard::{DeviceSnapshot, TagAction};

/// Counters gathered while planning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Devices in the inventory
    pub devices: usize,
    /// Devices skipped for lacking an id
    pub skipped: usize,
    /// Devices that already carried their desired tag
    pub already_correct: usize,
}

/// Device ids queued per tag operation, in inventory order.
///
/// A device lands in at most one add queue and at most one remove queue.
/// It can be in both an add and a remove queue when it is missing its
/// correct tag and carries the wrong one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPlan {
    pub add_cellular: Vec<String>,
    pub add_wifi: Vec<String>,
    pub remove_cellular: Vec<String>,
    pub remove_wifi: Vec<String>,
    /// Whether wrong tags were considered for removal
    pub prune_wrong_tags: bool,
    pub stats: PlanStats,
}

/// One queue of the plan, bound to its tag and action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagStep<'a> {
    pub capability: Capability,
    pub action: TagAction,
    pub tag: &'a str,
    pub ids: &'a [String],
}

impl ActionPlan {
    fn add_queue_mut(&mut self, capability: Capability) -> &mut Vec<String> {
        match capability {
            Capability::Cellular => &mut self.add_cellular,
            Capability::WifiOnly => &mut self.add_wifi,
        }
    }

    fn remove_queue_mut(&mut self, capability: Capability) -> &mut Vec<String> {
        match capability {
            Capability::Cellular => &mut self.remove_cellular,
            Capability::WifiOnly => &mut self.remove_wifi,
        }
    }

    /// Total device-tag additions queued
    pub fn additions(&self) -> usize {
        self.add_cellular.len() + self.add_wifi.len()
    }

    /// Total device-tag removals queued
    pub fn removals(&self) -> usize {
        self.remove_cellular.len() + self.remove_wifi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.additions() == 0 && self.removals() == 0
    }

    /// The queues in application order: add-cellular, add-wifi, then
    /// remove-cellular and remove-wifi when pruning is on.
    pub fn steps<'a>(&'a self, policy: &'a TagPolicy) -> Vec<TagStep<'a>> {
        let mut steps = vec![
            TagStep {
                capability: Capability::Cellular,
                action: TagAction::Add,
                tag: policy.tag_for(Capability::Cellular),
                ids: &self.add_cellular,
            },
            TagStep {
                capability: Capability::WifiOnly,
                action: TagAction::Add,
                tag: policy.tag_for(Capability::WifiOnly),
                ids: &self.add_wifi,
            },
        ];

        if self.prune_wrong_tags {
            steps.push(TagStep {
                capability: Capability::Cellular,
                action: TagAction::Remove,
                tag: policy.tag_for(Capability::Cellular),
                ids: &self.remove_cellular,
            });
            steps.push(TagStep {
                capability: Capability::WifiOnly,
                action: TagAction::Remove,
                tag: policy.tag_for(Capability::WifiOnly),
                ids: &self.remove_wifi,
            });
        }

        steps
    }
}

/// Build the action plan for a device inventory.
///
/// Devices without an id are logged and skipped. Tags outside the policy
/// are never touched.
pub fn plan(devices: &[DeviceSnapshot], policy: &TagPolicy, prune_wrong_tags: bool) -> ActionPlan {
    let mut plan = ActionPlan {
        prune_wrong_tags,
        ..ActionPlan::default()
    };
    plan.stats.devices = devices.len();

    for device in devices {
        log::debug!("Processing device: {:?}", device);

        let Some(id) = device.id.as_deref() else {
            log::warn!("Skipping device without an id: {:?}", device);
            plan.stats.skipped += 1;
            continue;
        };

        let capability = classify(device);
        let desired = policy.tag_for(capability);

        if device.has_tag(desired) {
            log::info!(
                "Device id '{}' already has the correct tag '{}', skipping",
                id,
                desired
            );
            plan.stats.already_correct += 1;
        } else {
            log::info!(
                "Device id '{}' is {} but missing tag in {:?}, tagging with '{}'",
                id,
                capability,
                device.tags,
                desired
            );
            plan.add_queue_mut(capability).push(id.to_string());
        }

        if prune_wrong_tags {
            let wrong_capability = capability.opposite();
            let wrong = policy.tag_for(wrong_capability);
            if device.has_tag(wrong) {
                log::info!(
                    "Device id '{}' is {} but incorrectly tagged with '{}', removing",
                    id,
                    capability,
                    wrong
                );
                plan.remove_queue_mut(wrong_capability).push(id.to_string());
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TagPolicy {
        TagPolicy::default()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn cellular_device_with_wifi_tag_is_retagged() {
        let devices = vec![DeviceSnapshot::new("D1").imei("123").tags(["Curbside_iPad"])];

        let plan = plan(&devices, &policy(), true);

        assert_eq!(plan.add_cellular, ids(&["D1"]));
        assert_eq!(plan.remove_wifi, ids(&["D1"]));
        assert!(plan.add_wifi.is_empty());
        assert!(plan.remove_cellular.is_empty());
    }

    #[test]
    fn wifi_device_with_cellular_tag_is_retagged() {
        let devices = vec![DeviceSnapshot::new("D2").tags(["Store_Ipad"])];

        let plan = plan(&devices, &policy(), true);

        assert_eq!(plan.add_wifi, ids(&["D2"]));
        assert_eq!(plan.remove_cellular, ids(&["D2"]));
        assert!(plan.add_cellular.is_empty());
        assert!(plan.remove_wifi.is_empty());
    }

    #[test]
    fn correctly_tagged_device_needs_nothing() {
        let devices = vec![DeviceSnapshot::new("D3").imei("999").tags(["Store_Ipad"])];

        let plan = plan(&devices, &policy(), true);

        assert!(plan.is_empty());
        assert_eq!(plan.stats.already_correct, 1);
    }

    #[test]
    fn device_without_id_is_skipped() {
        let devices = vec![
            DeviceSnapshot::default().imei("123"),
            DeviceSnapshot::new("D4"),
        ];

        let plan = plan(&devices, &policy(), true);

        assert_eq!(plan.add_wifi, ids(&["D4"]));
        assert!(plan.add_cellular.is_empty());
        assert_eq!(plan.stats.skipped, 1);
        assert_eq!(plan.stats.devices, 2);
    }

    #[test]
    fn wrong_tag_kept_without_pruning() {
        let devices = vec![DeviceSnapshot::new("D1").imei("123").tags(["Curbside_iPad"])];

        let plan = plan(&devices, &policy(), false);

        assert_eq!(plan.add_cellular, ids(&["D1"]));
        assert!(plan.remove_wifi.is_empty());
        assert_eq!(plan.steps(&policy()).len(), 2);
    }

    #[test]
    fn device_with_both_tags_only_loses_the_wrong_one() {
        let devices = vec![
            DeviceSnapshot::new("D5")
                .iccid("8901")
                .tags(["Store_Ipad", "Curbside_iPad"]),
        ];

        let plan = plan(&devices, &policy(), true);

        assert!(plan.add_cellular.is_empty());
        assert_eq!(plan.remove_wifi, ids(&["D5"]));
    }

    #[test]
    fn unrelated_tags_are_left_alone() {
        let devices = vec![
            DeviceSnapshot::new("D6").tags(["Curbside_iPad", "Lobby", "Kiosk"]),
            DeviceSnapshot::new("D7").imei("1").tags(["Lobby"]),
        ];

        let plan = plan(&devices, &policy(), true);

        assert_eq!(plan.add_cellular, ids(&["D7"]));
        assert!(plan.add_wifi.is_empty());
        assert_eq!(plan.removals(), 0);
    }

    #[test]
    fn queues_keep_inventory_order() {
        let devices: Vec<_> = ["B", "A", "C"]
            .iter()
            .map(|id| DeviceSnapshot::new(*id).phone_number("+1555"))
            .collect();

        let plan = plan(&devices, &policy(), false);

        assert_eq!(plan.add_cellular, ids(&["B", "A", "C"]));
    }

    #[test]
    fn add_queues_are_disjoint() {
        let devices = vec![
            DeviceSnapshot::new("D1").imei("1"),
            DeviceSnapshot::new("D2"),
            DeviceSnapshot::new("D3").sim_carrier_network("AT&T").tags(["Curbside_iPad"]),
            DeviceSnapshot::new("D4").tags(["Store_Ipad"]),
        ];

        let plan = plan(&devices, &policy(), true);

        for id in &plan.add_cellular {
            assert!(!plan.add_wifi.contains(id), "{id} queued for both adds");
        }
        for id in &plan.remove_cellular {
            assert!(!plan.remove_wifi.contains(id), "{id} queued for both removes");
        }
    }

    #[test]
    fn replanning_after_applying_is_empty() {
        let mut devices = vec![
            DeviceSnapshot::new("D1").imei("123").tags(["Curbside_iPad"]),
            DeviceSnapshot::new("D2").tags(["Store_Ipad"]),
            DeviceSnapshot::new("D3"),
        ];
        let policy = policy();

        let first = plan(&devices, &policy, true);
        for step in first.steps(&policy) {
            for device in devices
                .iter_mut()
                .filter(|d| d.id.as_ref().is_some_and(|id| step.ids.contains(id)))
            {
                match step.action {
                    TagAction::Add => {
                        device.tags.insert(step.tag.to_string());
                    }
                    TagAction::Remove => {
                        device.tags.remove(step.tag);
                    }
                }
            }
        }

        let second = plan(&devices, &policy, true);
        assert!(second.is_empty());
        assert_eq!(second.stats.already_correct, 3);
    }

    #[test]
    fn steps_follow_fixed_order() {
        let policy = policy();
        let plan = plan(&[], &policy, true);

        let order: Vec<_> = plan
            .steps(&policy)
            .iter()
            .map(|s| (s.action, s.tag))
            .collect();
        assert_eq!(
            order,
            vec![
                (TagAction::Add, "Store_Ipad"),
                (TagAction::Add, "Curbside_iPad"),
                (TagAction::Remove, "Store_Ipad"),
                (TagAction::Remove, "Curbside_iPad"),
            ]
        );
    }
}
