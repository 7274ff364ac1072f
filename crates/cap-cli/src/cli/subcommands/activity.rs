use clap::{Args, Subcommand};

/// Activity log commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ActivityCommands {
    /// List one page of activity, newest first.
    List {
        #[command(flatten)]
        filter: ActivityFilterArgs,
        /// 1-based page number.
        #[arg(long)]
        page: Option<u32>,
    },
    /// Export one page of activity to `activity_logs_<date>.csv`.
    Export {
        #[command(flatten)]
        filter: ActivityFilterArgs,
        #[arg(long)]
        page: Option<u32>,
        /// Target directory; defaults to `activity.export_dir`.
        #[arg(long)]
        dir: Option<String>,
    },
}

/// Filters shared by `list` and `export`.
#[derive(Clone, Debug, Default, Args)]
pub struct ActivityFilterArgs {
    /// all, auth, data, admin
    #[arg(long)]
    pub tab: Option<String>,
    /// Exact action, e.g. `create_projects`.
    #[arg(long)]
    pub action: Option<String>,
    #[arg(long)]
    pub entity_type: Option<String>,
    /// success, failure, pending
    #[arg(long)]
    pub status: Option<String>,
    /// Lower bound (YYYY-MM-DD or RFC 3339), inclusive.
    #[arg(long)]
    pub from: Option<String>,
    /// Upper bound (YYYY-MM-DD or RFC 3339), inclusive.
    #[arg(long)]
    pub to: Option<String>,
    /// Free-text search over the fetched page.
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub page_size: Option<u32>,
}
