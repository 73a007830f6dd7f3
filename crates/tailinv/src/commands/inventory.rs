//! `inventory`: Ansible dynamic inventory script protocol.

use tailinv_core::Tailnet;

use crate::ansible::{self, InventoryDocument};
use crate::cli::{GlobalOpts, InventoryArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    tailnet: &Tailnet,
    args: &InventoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    tracing::debug!(list = args.list, host = ?args.host, "inventory request");
    let inventory = tailnet.inventory().await?;
    tracing::info!(
        hosts = inventory.hosts.len(),
        groups = inventory.groups.len(),
        "inventory ready"
    );

    let rendered = if let Some(ref host) = args.host {
        let vars = ansible::host_vars(&inventory, host);
        render(global.output, &vars, || vars.values().cloned().collect())
    } else {
        let document = InventoryDocument::new(&inventory);
        render(global.output, &document, || {
            inventory.hosts.keys().cloned().collect()
        })
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Ansible reads JSON, so the table format falls back to pretty JSON.
fn render<T: serde::Serialize>(
    format: OutputFormat,
    data: &T,
    plain_lines: impl FnOnce() -> Vec<String>,
) -> String {
    match format {
        OutputFormat::Table | OutputFormat::Json => output::render_json_pretty(data),
        OutputFormat::JsonCompact => output::render_json_compact(data),
        OutputFormat::Yaml => output::render_yaml(data),
        OutputFormat::Plain => plain_lines().join("\n"),
    }
}
