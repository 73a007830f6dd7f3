//! `token`: token cache management.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tailinv_core::{TokenStatus, TokenStore};

use crate::cli::{GlobalOpts, TokenArgs, TokenCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::connect;

#[derive(Debug, Serialize)]
struct StatusView {
    path: String,
    #[serde(flatten)]
    status: TokenStatus,
}

impl StatusView {
    fn state(&self) -> &'static str {
        match self.status {
            TokenStatus::Missing => "missing",
            TokenStatus::Corrupt { .. } => "corrupt",
            TokenStatus::Expired { .. } => "expired",
            TokenStatus::Valid { .. } => "valid",
        }
    }
}

fn detail(view: &StatusView, color: bool) -> String {
    let mut lines = vec![
        format!("Cache:   {}", view.path),
        format!("State:   {}", output::paint_state(view.state(), color)),
    ];
    match &view.status {
        TokenStatus::Valid {
            expires_at: Some(at),
        }
        | TokenStatus::Expired { expires_at: at } => {
            lines.push(format!("Expires: {}", describe_expiry(*at, Utc::now())));
        }
        TokenStatus::Valid { expires_at: None } => lines.push("Expires: never".into()),
        TokenStatus::Corrupt { reason } => lines.push(format!("Reason:  {reason}")),
        TokenStatus::Missing => {}
    }
    lines.join("\n")
}

fn describe_expiry(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let stamp = at.format("%Y-%m-%d %H:%M:%S UTC");
    let secs = (at - now).num_seconds();
    if secs >= 0 {
        format!("{stamp} (in {}m)", secs / 60)
    } else {
        format!("{stamp} ({}m ago)", -secs / 60)
    }
}

pub async fn handle(args: TokenArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TokenCommand::Status => {
            let store = TokenStore::new(config::token_cache_path(global)?);
            let view = StatusView {
                path: store.path().display().to_string(),
                status: store.status(),
            };
            let color = output::should_color(global.color);
            let out = output::render_single(
                global.output,
                &view,
                |v| detail(v, color),
                |v| v.state().to_owned(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TokenCommand::Clear => {
            let store = TokenStore::new(config::token_cache_path(global)?);
            let removed = store.clear()?;
            let msg = if removed {
                format!("Removed {}", store.path().display())
            } else {
                format!("No token cached at {}", store.path().display())
            };
            if !global.quiet {
                eprintln!("{msg}");
            }
            Ok(())
        }

        TokenCommand::Refresh => {
            let tailnet = connect(global, &[])?;
            let token = tailnet.refresh_token().await?;
            if !global.quiet {
                let expiry = token
                    .expires_at
                    .map_or_else(|| "no expiry".into(), |at| describe_expiry(at, Utc::now()));
                eprintln!(
                    "New token cached at {} (expires {expiry})",
                    tailnet.token_store().path().display()
                );
            }
            Ok(())
        }
    }
}
