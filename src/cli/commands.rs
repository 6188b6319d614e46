use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "readmark", about = concat!("readmark v", env!("CARGO_PKG_VERSION"), " - track what you have read"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different library directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List items and their read status
    Status(StatusArgs),
    /// Show read counts per section
    Stats,
    /// Mark items as read
    Mark(IdsArgs),
    /// Mark items as unread
    Unmark(IdsArgs),
    /// Mark every item of a section
    MarkAll(MarkAllArgs),
    /// Compare a CSV file with the current status, and optionally apply it
    Import(ImportArgs),
    /// Write the read items to a CSV file
    Export(ExportArgs),
    /// Print count changes made by other processes until interrupted
    Watch,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct StatusArgs {
    /// Only show this section
    #[arg(long)]
    pub section: Option<String>,
    /// Which items to show (all, read, unread)
    #[arg(long, default_value = "all")]
    pub filter: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdsArgs {
    /// Item IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct MarkAllArgs {
    /// Section ID
    pub section: String,
    /// Mark every item unread instead
    #[arg(long)]
    pub unread: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: String,
    /// Only consider rows of this section
    #[arg(long)]
    pub section: Option<String>,
    /// Apply the changes (default: dry run)
    #[arg(long)]
    pub apply: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Output file (default: readmark-<date>.csv)
    #[arg(short, long)]
    pub output: Option<String>,
}
