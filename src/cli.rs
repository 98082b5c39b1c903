//! CLI argument definitions using clap with subcommand architecture

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Code navigation tool server with budget-shaped results
#[derive(Parser, Debug)]
#[command(name = "codenav")]
#[command(about = "Code navigation queries over a project index snapshot")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Index snapshot file (JSON) produced by your indexer
    #[arg(short, long, global = true, env = "CODENAV_INDEX", value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Configuration file (TOML); defaults apply when absent
    #[arg(long, global = true, env = "CODENAV_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (applies to all commands)
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands for codenav
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a call hierarchy around a symbol
    Callers(CallersArgs),

    /// Build an override/implementation hierarchy around a member
    Overrides(OverridesArgs),

    /// List references to a symbol
    References(ReferencesArgs),

    /// Show project or file diagnostics
    Diagnostics(DiagnosticsArgs),

    /// Plan a bulk rename of a symbol
    Rename(RenameArgs),

    /// Show summary counts of the loaded snapshot
    Summary,

    /// Start the MCP server (for AI coding assistants)
    Serve,
}

/// Arguments for the callers command
#[derive(Args, Debug)]
pub struct CallersArgs {
    /// Symbol name, id, or wildcard pattern
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Traversal depth per direction
    #[arg(long, default_value_t = 3)]
    pub depth: usize,

    /// Direction to expand
    #[arg(long, default_value = "both", value_enum)]
    pub direction: DirectionArg,

    /// Maximum nodes to return
    #[arg(long)]
    pub limit: Option<usize>,

    /// Keep calls into dependency symbols
    #[arg(long)]
    pub include_external: bool,
}

/// Arguments for the overrides command
#[derive(Args, Debug)]
pub struct OverridesArgs {
    /// Member or type name, id, or wildcard pattern
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Traversal depth for overriding members
    #[arg(long, default_value_t = 3)]
    pub depth: usize,

    /// Direction to expand
    #[arg(long, default_value = "both", value_enum)]
    pub direction: DirectionArg,

    /// Maximum nodes to return
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the references command
#[derive(Args, Debug)]
pub struct ReferencesArgs {
    /// Symbol name, id, or wildcard pattern
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Maximum references to return
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the diagnostics command
#[derive(Args, Debug)]
pub struct DiagnosticsArgs {
    /// Restrict to one document (project-wide when omitted)
    #[arg(long, value_name = "FILE")]
    pub file: Option<String>,

    /// Minimum severity to include
    #[arg(long, value_enum)]
    pub severity: Option<SeverityArg>,

    /// Maximum diagnostics to return
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Arguments for the rename command
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Symbol name, id, or wildcard pattern
    #[arg(value_name = "SYMBOL")]
    pub symbol: String,

    /// Replacement name
    #[arg(value_name = "NEW_NAME")]
    pub new_name: String,

    /// Maximum edits to return
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact human-readable text
    Text,
    /// Pretty-printed response envelope
    Json,
}

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Incoming,
    Outgoing,
    Both,
}

impl DirectionArg {
    pub fn to_direction(self) -> crate::hierarchy::Direction {
        match self {
            DirectionArg::Incoming => crate::hierarchy::Direction::Incoming,
            DirectionArg::Outgoing => crate::hierarchy::Direction::Outgoing,
            DirectionArg::Both => crate::hierarchy::Direction::Both,
        }
    }
}

/// Severity filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeverityArg {
    Error,
    Warning,
    Info,
    Hint,
}

impl SeverityArg {
    pub fn to_severity(self) -> crate::schema::Severity {
        match self {
            SeverityArg::Error => crate::schema::Severity::Error,
            SeverityArg::Warning => crate::schema::Severity::Warning,
            SeverityArg::Info => crate::schema::Severity::Info,
            SeverityArg::Hint => crate::schema::Severity::Hint,
        }
    }
}
