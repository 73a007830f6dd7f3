//! `nodes`: selected devices and their addresses.

use serde::Serialize;
use tabled::Tabled;

use tailinv_core::{InventoryResult, Tailnet};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Node {
    hostname: String,
    address: String,
    groups: Vec<String>,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Groups")]
    groups: String,
}

impl From<&Node> for NodeRow {
    fn from(n: &Node) -> Self {
        Self {
            hostname: n.hostname.clone(),
            address: n.address.clone(),
            groups: n.groups.join(", "),
        }
    }
}

fn nodes(inventory: &InventoryResult) -> Vec<Node> {
    inventory
        .hosts
        .keys()
        .map(|host| Node {
            hostname: host.clone(),
            address: inventory.address(host).unwrap_or_default().to_owned(),
            groups: inventory
                .groups
                .iter()
                .filter(|(_, members)| members.contains(host))
                .map(|(group, _)| group.clone())
                .collect(),
        })
        .collect()
}

pub async fn handle(tailnet: &Tailnet, global: &GlobalOpts) -> Result<(), CliError> {
    let inventory = tailnet.inventory().await?;
    let nodes = nodes(&inventory);

    let out = output::render_list(
        global.output,
        &nodes,
        |n| NodeRow::from(n),
        |n| format!("{}\t{}", n.hostname, n.address),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tailinv_core::{ANSIBLE_HOST, InventorySink};

    use super::*;

    #[test]
    fn nodes_list_address_and_groups() {
        let mut inv = InventoryResult::default();
        inv.set_variable("a", ANSIBLE_HOST, "10.0.0.1");
        inv.set_variable("b", ANSIBLE_HOST, "10.0.0.2");
        inv.add_child("tag_web", "a");
        inv.add_child("tag_prod", "a");

        let nodes = nodes(&inv);

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].address, "10.0.0.1");
        assert_eq!(nodes[0].groups, vec!["tag_web", "tag_prod"]);
        assert!(nodes[1].groups.is_empty());
    }
}
