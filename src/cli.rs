use crate::audit::SortColumn;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// qpick – browse collections or search questions, print the chosen question id
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub pick: PickArgs,

    /// TOML file with [theme] and [policy] overrides.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Append logs to this file instead of discarding them while the picker is open.
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List questions as a sortable, filterable audit table.
    Audit(AuditArgs),
}

#[derive(Args, Debug)]
pub struct PickArgs {
    /// Collections export (JSON array of {id, name, location, personal_owner_id}).
    #[arg(long, value_name = "FILE")]
    pub collections: Option<PathBuf>,

    /// Questions export (JSON array of {id, name, collection_id, display}).
    #[arg(long, value_name = "FILE")]
    pub questions: Option<PathBuf>,

    /// Collection to open first (defaults to the root).
    #[arg(long, value_name = "ID")]
    pub initial: Option<String>,

    /// Start with this search text.
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Print the picker view once and exit without a TUI.
    #[arg(long)]
    pub headless: bool,

    /// List questions of the personal collection without a search term.
    #[arg(long)]
    pub browse_personal: bool,

    /// Let a root-identified child appear in child lists.
    #[arg(long)]
    pub show_nested_root: bool,

    /// Current user id; other users' personal collections go under "personal".
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Questions export.
    #[arg(long, value_name = "FILE")]
    pub questions: PathBuf,

    /// Collections export, used to resolve collection names.
    #[arg(long, value_name = "FILE")]
    pub collections: Option<PathBuf>,

    /// Only questions whose name contains TEXT.
    #[arg(long, value_name = "TEXT")]
    pub question_filter: Option<String>,

    /// Only questions whose collection name contains TEXT.
    #[arg(long, value_name = "TEXT")]
    pub collection_filter: Option<String>,

    /// Sort column. Repeat to flip the order, as clicking a header twice would.
    #[arg(long, value_enum, value_name = "COLUMN")]
    pub sort: Vec<SortColumn>,

    /// Force descending order.
    #[arg(long)]
    pub desc: bool,

    /// Zero-based page of 50 rows.
    #[arg(long, default_value_t = 0)]
    pub page: usize,
}
