//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::Password;

use tailinv_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// TOML view of the resolved config, secret masked.
fn format_config(cfg: &Config, source: &str) -> String {
    let body = toml::to_string_pretty(&cfg.redacted())
        .unwrap_or_else(|e| format!("# cannot render config: {e}\n"));
    format!("# {source}\n{body}")
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let path = config::config_path(global);
            let source = path.display().to_string();
            let out = output::render_single(
                global.output,
                &cfg.redacted(),
                |c| format_config(c, &source),
                |_| source.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::SetSecret => {
            let cfg = config::load(global)?;
            let client_id = cfg
                .client_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .ok_or(CliError::MissingSetting {
                    field: "client_id",
                    flag: "client-id",
                    env: "TAILSCALE_CLIENT_ID",
                })?;

            let secret = match global.client_secret.as_deref().filter(|s| !s.is_empty()) {
                Some(secret) => secret.to_owned(),
                None if std::io::stdin().is_terminal() => Password::new()
                    .with_prompt(format!("Client secret for {client_id}"))
                    .interact()
                    .map_err(prompt_err)?,
                None => {
                    return Err(CliError::Validation {
                        field: "client_secret".into(),
                        reason: "no terminal to prompt on; pass --client-secret".into(),
                    });
                }
            };

            tailinv_config::store_client_secret(client_id, &secret)?;
            if !global.quiet {
                eprintln!(
                    "Client secret for '{client_id}' stored in the system keyring ({}/{})",
                    tailinv_config::KEYRING_SERVICE,
                    tailinv_config::keyring_entry_name(client_id)
                );
            }
            Ok(())
        }
    }
}
