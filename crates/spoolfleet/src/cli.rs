//! Argument definitions for the `spoolfleet` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "spoolfleet",
    version,
    about = "Manage a spoolfleet filament inventory and print queue backend",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the config file (default: platform config dir).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config file).
    #[arg(long, global = true, env = "SPOOLFLEET_BACKEND_URL", value_name = "URL")]
    pub backend_url: Option<String>,

    /// API key (overrides config file). Prefer SPOOLFLEET_API_KEY.
    #[arg(long, global = true, hide_env_values = true, env = "SPOOLFLEET_API_KEY")]
    pub api_key: Option<String>,

    /// Output format.
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Request timeout in seconds (overrides config file).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output.
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Spool inventory.
    Spools(SpoolsArgs),

    /// Printer status.
    Status(StatusArgs),

    /// Per-printer queue with filament feasibility.
    Queue(QueueArgs),

    /// Clear a printer's build plate so the next queued job can start.
    ClearPlate(ClearPlateArgs),

    /// Stream live scale-station display updates.
    Watch(WatchArgs),

    /// Configuration management.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

// ── Per-command args ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SpoolsArgs {
    #[command(subcommand)]
    pub command: SpoolsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SpoolsCommand {
    /// List spools.
    List {
        /// Include archived spools.
        #[arg(long)]
        archived: bool,
    },
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Printer id. Omit to list all printers.
    pub printer_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct QueueArgs {
    /// Printer id.
    pub printer_id: i64,

    /// Show all pending items, not just the feasible ones.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ClearPlateArgs {
    /// Printer id.
    pub printer_id: i64,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only show updates from this device.
    pub device_id: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file if none exists.
    Init,
    /// Print the effective configuration.
    Show,
    /// Print the config file path.
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}
