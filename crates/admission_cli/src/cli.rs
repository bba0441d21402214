use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "admission", version, about = "Hostel admission intake tool")]
pub struct Cli {
    /// Keep settings, drafts and logs under this directory instead of the platform data dir
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Check values against the intake rules
    Validate {
        #[command(subcommand)]
        what: ValidateCmd,
    },
    /// Inspect and manage the stored draft
    Draft {
        #[command(subcommand)]
        action: DraftCmd,
    },
    /// Walk a filled form through every step and submit it
    Submit {
        /// Form state as JSON
        form: PathBuf,
        /// Override the configured backend base URL
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Past submission attempts
    History {
        #[command(subcommand)]
        action: HistoryCmd,
    },
    /// Work with an exported application list
    Admin {
        #[command(subcommand)]
        action: AdminCmd,
    },
    /// Print the effective settings
    Config,
}

#[derive(Subcommand)]
pub enum ValidateCmd {
    /// One field, e.g. `validate field email a@b.com`
    Field { name: String, value: String },
    /// A whole form state JSON file
    Form { form: PathBuf },
}

#[derive(Subcommand)]
pub enum DraftCmd {
    /// Print the draft if it is still valid
    Show,
    /// Timestamp, version and completion of the stored draft
    Info,
    /// Store a form state JSON file as the draft
    Save { form: PathBuf },
    Clear,
    /// Bytes used per storage key
    Usage,
    /// Write draft and history as one JSON document
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Restore a document written by `draft export`
    Import { file: PathBuf },
}

#[derive(Subcommand)]
pub enum HistoryCmd {
    List,
    Show { id: String },
    Clear,
    /// Drop entries past the configured history retention
    Cleanup,
}

#[derive(Args)]
pub struct ListArgs {
    /// Matches names, room, email, ids, status and phone digits
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long, default_value = "submission_date")]
    pub sort: String,
    #[arg(long)]
    pub asc: bool,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    #[arg(long, default_value_t = admission::admin::DEFAULT_PER_PAGE)]
    pub per_page: usize,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum FormatArg {
    Csv,
    Json,
}

#[derive(Subcommand)]
pub enum AdminCmd {
    List {
        /// JSON array of application records
        records: PathBuf,
        #[command(flatten)]
        args: ListArgs,
    },
    Stats { records: PathBuf },
    Export {
        records: PathBuf,
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        #[arg(long)]
        status: Option<String>,
        /// Target directory; defaults to the exports directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Set one status on several records and rewrite the file
    BulkStatus {
        records: PathBuf,
        #[arg(long)]
        status: String,
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },
}
