use clap::{Args, Subcommand};

/// Project commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProjectCommands {
    /// Create a project and its cap table.
    Create {
        #[arg(long)]
        name: String,
        /// Project type, e.g. `token`, `equity`.
        #[arg(long = "type")]
        project_type: String,
        #[command(flatten)]
        fields: ProjectFieldArgs,
    },
    /// Update a project. Renaming also renames its default cap table.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        project_type: Option<String>,
        #[command(flatten)]
        fields: ProjectFieldArgs,
    },
    /// Get a project with its cap table.
    Get { id: String },
    /// List projects, newest first.
    List {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Investor count and total raised.
    Stats { id: String },
    /// Delete a project and everything that depends on it.
    Delete { id: String },
}

/// Optional project fields shared by `create` and `update`.
#[derive(Clone, Debug, Default, Args)]
pub struct ProjectFieldArgs {
    #[arg(long)]
    pub description: Option<String>,
    /// draft, active, completed, archived
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub token_symbol: Option<String>,
    #[arg(long)]
    pub target_raise: Option<f64>,
    #[arg(long)]
    pub authorized_shares: Option<i64>,
    #[arg(long)]
    pub share_price: Option<f64>,
    #[arg(long)]
    pub company_valuation: Option<f64>,
    #[arg(long)]
    pub funding_round: Option<String>,
    #[arg(long)]
    pub legal_entity: Option<String>,
    #[arg(long)]
    pub jurisdiction: Option<String>,
    #[arg(long)]
    pub tax_id: Option<String>,
}

impl ProjectFieldArgs {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.status.is_none()
            && self.token_symbol.is_none()
            && self.target_raise.is_none()
            && self.authorized_shares.is_none()
            && self.share_price.is_none()
            && self.company_valuation.is_none()
            && self.funding_round.is_none()
            && self.legal_entity.is_none()
            && self.jurisdiction.is_none()
            && self.tax_id.is_none()
    }
}
