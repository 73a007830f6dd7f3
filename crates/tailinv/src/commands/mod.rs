//! Command dispatch: bridges CLI args -> `Tailnet` -> output formatting.

pub mod config_cmd;
pub mod inventory;
pub mod nodes;
pub mod token;

use tailinv_core::Tailnet;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

/// Dispatch a tailnet-bound command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Inventory(args) => {
            let tailnet = connect(global, &args.tags)?;
            inventory::handle(&tailnet, &args, global).await
        }
        Command::Nodes(args) => {
            let tailnet = connect(global, &args.tags)?;
            nodes::handle(&tailnet, global).await
        }
        Command::Token(args) => token::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}

/// Resolve the configuration and build the tailnet facade.
pub fn connect(global: &GlobalOpts, tags: &[String]) -> Result<Tailnet, CliError> {
    let config = config::build_inventory_config(global, tags)?;
    tracing::debug!(
        tailnet = %config.tailnet,
        tags = ?config.tags,
        cache = %config.token_cache.display(),
        "resolved configuration"
    );
    Ok(Tailnet::new(config)?)
}
