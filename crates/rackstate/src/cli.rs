//! Clap derive structures for the `rackstate` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rackstate -- keep NetBox in line with the hardware it describes
#[derive(Debug, Parser)]
#[command(
    name = "rackstate",
    version,
    about = "Reconcile this server's hardware facts with its NetBox device records",
    long_about = "Reconcile this server's hardware facts with its NetBox device records.\n\n\
        Sites, locations and racks are created on first reference and removed\n\
        once the last device leaves them. Running twice converges.",
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
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "RACKSTATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// NetBox URL (overrides [netbox] url)
    #[arg(long, env = "RACKSTATE_URL", global = true)]
    pub url: Option<String>,

    /// NetBox API token (overrides every configured token source)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides [netbox] timeout)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one reconciliation pass for this machine
    Sync(SyncArgs),

    /// Evaluate every configured placement driver and print the values
    Resolve,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Hardware facts file (JSON, or TOML with a .toml extension)
    #[arg(long, short = 'f')]
    pub facts: PathBuf,

    /// Overwrite every managed field, including topology
    #[arg(long)]
    pub update_all: bool,

    /// Move the device when its site, location or rack changes
    #[arg(long)]
    pub update_location: bool,

    /// Delete a device holding this hostname under another serial
    #[arg(long)]
    pub purge_old_devices: bool,

    /// Add configured tags to the existing ones instead of replacing them
    #[arg(long)]
    pub preserve_tags: bool,

    /// Track expansion units as their own devices
    #[arg(long)]
    pub expansion_as_device: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
