//! Clap derive structures for the `tailinv` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this module may
//! only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tailinv -- Ansible dynamic inventory for Tailscale
#[derive(Debug, Parser)]
#[command(
    name = "tailinv",
    version,
    about = "Ansible dynamic inventory for Tailscale tailnets",
    long_about = "Lists the devices of a Tailscale tailnet through the management API\n\
        and groups them by ACL tag for Ansible.\n\n\
        Use as an inventory script: ansible-inventory -i 'tailinv inventory' --list",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (TOML, or Ansible-style YAML for .yml/.yaml)
    #[arg(long, env = "TAILINV_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// OAuth client ID
    #[arg(long, env = "TAILSCALE_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "TAILSCALE_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Tailnet name ("-" for the OAuth client's default tailnet)
    #[arg(long, env = "TAILNET_NAME", global = true)]
    pub tailnet: Option<String>,

    /// Token cache file
    #[arg(long, env = "TAILINV_TOKEN_CACHE", global = true)]
    pub token_cache: Option<PathBuf>,

    /// Tailscale API base URL
    #[arg(long, global = true, hide = true)]
    pub api_base: Option<String>,

    /// OAuth token endpoint
    #[arg(long, global = true, hide = true)]
    pub token_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "TAILINV_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one record per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Emit the Ansible dynamic inventory (JSON)
    #[command(alias = "inv")]
    Inventory(InventoryArgs),

    /// List selected devices with their addresses
    #[command(alias = "ls")]
    Nodes(NodesArgs),

    /// Inspect or reset the cached OAuth token
    Token(TokenArgs),

    /// Show configuration and manage stored credentials
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Inventory ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// Print the whole inventory (the default)
    #[arg(long, conflicts_with = "host")]
    pub list: bool,

    /// Print the variables of one host
    #[arg(long, value_name = "HOSTNAME")]
    pub host: Option<String>,

    /// Only include devices carrying one of these tags (overrides config)
    #[arg(value_name = "TAGS")]
    pub tags: Vec<String>,
}

// ── Nodes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NodesArgs {
    /// Only include devices carrying one of these tags (overrides config)
    #[arg(value_name = "TAGS")]
    pub tags: Vec<String>,
}

// ── Token ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Show the state of the token cache (no network access)
    Status,

    /// Delete the token cache
    Clear,

    /// Discard the cached token and authenticate again
    Refresh,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (secret redacted)
    Show,

    /// Print the config file location
    Path,

    /// Store the OAuth client secret in the system keyring
    SetSecret,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
