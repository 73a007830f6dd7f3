//! Ansible dynamic-inventory document.
//!
//! Shape expected from an inventory script's `--list`:
//!
//! ```json
//! {
//!   "_meta": { "hostvars": { "a": { "ansible_host": "10.0.0.1" } } },
//!   "all": { "children": ["ungrouped", "tag_web"] },
//!   "tag_web": { "hosts": ["a"] },
//!   "ungrouped": { "hosts": [] }
//! }
//! ```

use indexmap::IndexMap;
use serde::Serialize;

use tailinv_core::{HostVars, InventoryResult};

const UNGROUPED: &str = "ungrouped";

/// `--list` output, borrowed from an [`InventoryResult`].
#[derive(Debug, Serialize)]
pub struct InventoryDocument<'a> {
    #[serde(rename = "_meta")]
    meta: Meta<'a>,
    all: Children<'a>,
    #[serde(flatten)]
    groups: IndexMap<&'a str, Hosts<'a>>,
}

#[derive(Debug, Serialize)]
struct Meta<'a> {
    hostvars: &'a IndexMap<String, HostVars>,
}

#[derive(Debug, Serialize)]
struct Children<'a> {
    children: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct Hosts<'a> {
    hosts: Vec<&'a str>,
}

impl<'a> InventoryDocument<'a> {
    pub fn new(inventory: &'a InventoryResult) -> Self {
        let mut groups: IndexMap<&str, Hosts<'_>> = inventory
            .groups
            .iter()
            .map(|(name, members)| {
                let hosts = members.iter().map(String::as_str).collect();
                (name.as_str(), Hosts { hosts })
            })
            .collect();
        groups.insert(
            UNGROUPED,
            Hosts {
                hosts: inventory.ungrouped().collect(),
            },
        );

        let children = std::iter::once(UNGROUPED)
            .chain(inventory.groups.keys().map(String::as_str))
            .collect();

        Self {
            meta: Meta {
                hostvars: &inventory.hosts,
            },
            all: Children { children },
            groups,
        }
    }
}

/// `--host` output: the host's variables, or an empty object for an
/// unknown host.
pub fn host_vars(inventory: &InventoryResult, host: &str) -> HostVars {
    inventory.hosts.get(host).cloned().unwrap_or_default()
}
