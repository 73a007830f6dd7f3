// ── Inventory model ──
//
// The host/group structure handed to an inventory consumer, and the four
// operations through which any consumer receives it.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Host variable carrying the address Ansible connects to.
pub const ANSIBLE_HOST: &str = "ansible_host";

/// Variables attached to one host.
pub type HostVars = IndexMap<String, String>;

/// Receiver of inventory data.
///
/// Both group operations are idempotent: creating an existing group or
/// adding an existing member has no observable effect.
pub trait InventorySink {
    fn add_host(&mut self, host: &str);
    fn set_variable(&mut self, host: &str, key: &str, value: &str);
    fn add_group(&mut self, group: &str);
    fn add_child(&mut self, group: &str, host: &str);
}

/// Hosts and tag groups built from one device listing.
///
/// Every member of every group is also a key of `hosts`. Hosts and groups
/// keep first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryResult {
    pub hosts: IndexMap<String, HostVars>,
    pub groups: IndexMap<String, IndexSet<String>>,
}

impl InventoryResult {
    /// The `ansible_host` address recorded for `host`.
    pub fn address(&self, host: &str) -> Option<&str> {
        self.hosts
            .get(host)
            .and_then(|vars| vars.get(ANSIBLE_HOST))
            .map(String::as_str)
    }

    /// Members of `group`, if the group exists.
    pub fn group(&self, group: &str) -> Option<&IndexSet<String>> {
        self.groups.get(group)
    }

    /// Hosts that belong to no group.
    pub fn ungrouped(&self) -> impl Iterator<Item = &str> {
        self.hosts
            .keys()
            .filter(|host| !self.groups.values().any(|members| members.contains(*host)))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Re-express this result through the four sink operations.
    pub fn replay<S: InventorySink + ?Sized>(&self, sink: &mut S) {
        for (host, vars) in &self.hosts {
            sink.add_host(host);
            for (key, value) in vars {
                sink.set_variable(host, key, value);
            }
        }
        for (group, members) in &self.groups {
            sink.add_group(group);
            for host in members {
                sink.add_child(group, host);
            }
        }
    }
}

impl InventorySink for InventoryResult {
    fn add_host(&mut self, host: &str) {
        self.hosts.entry(host.to_owned()).or_default();
    }

    fn set_variable(&mut self, host: &str, key: &str, value: &str) {
        self.hosts
            .entry(host.to_owned())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
    }

    fn add_group(&mut self, group: &str) {
        self.groups.entry(group.to_owned()).or_default();
    }

    fn add_child(&mut self, group: &str, host: &str) {
        self.add_host(host);
        self.groups
            .entry(group.to_owned())
            .or_default()
            .insert(host.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn group_operations_are_idempotent() {
        let mut inv = InventoryResult::default();
        inv.add_host("a");
        inv.add_group("tag_web");
        inv.add_child("tag_web", "a");
        let once = inv.clone();

        inv.add_host("a");
        inv.add_group("tag_web");
        inv.add_child("tag_web", "a");

        assert_eq!(inv, once);
        assert_eq!(inv.group("tag_web").map(IndexSet::len), Some(1));
    }

    #[test]
    fn add_host_keeps_existing_variables() {
        let mut inv = InventoryResult::default();
        inv.set_variable("a", ANSIBLE_HOST, "10.0.0.1");
        inv.add_host("a");
        assert_eq!(inv.address("a"), Some("10.0.0.1"));
    }

    #[test]
    fn add_child_registers_unknown_host() {
        let mut inv = InventoryResult::default();
        inv.add_child("tag_db", "b");
        assert!(inv.hosts.contains_key("b"));
    }

    #[test]
    fn ungrouped_lists_hosts_without_groups() {
        let mut inv = InventoryResult::default();
        inv.add_host("a");
        inv.add_host("b");
        inv.add_child("tag_web", "a");
        assert_eq!(inv.ungrouped().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn replay_reproduces_the_result() {
        let mut inv = InventoryResult::default();
        inv.set_variable("a", ANSIBLE_HOST, "10.0.0.1");
        inv.set_variable("b", ANSIBLE_HOST, "10.0.0.2");
        inv.add_child("tag_web", "a");
        inv.add_child("tag_prod", "a");

        let mut copy = InventoryResult::default();
        inv.replay(&mut copy);

        assert_eq!(copy, inv);
    }
}
