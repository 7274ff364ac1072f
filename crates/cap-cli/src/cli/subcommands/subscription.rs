use clap::Subcommand;

/// Subscription commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SubscriptionCommands {
    /// Subscribe an investor to a project.
    Add {
        #[arg(long)]
        project: String,
        #[arg(long)]
        investor: String,
        /// External agreement reference.
        #[arg(long = "ref")]
        reference: String,
        #[arg(long, default_value = "EUR")]
        currency: String,
        #[arg(long)]
        amount: f64,
        /// Subscription date (YYYY-MM-DD or RFC 3339); defaults to now.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        confirmed: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update a subscription.
    Update {
        id: String,
        #[arg(long = "ref")]
        reference: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        confirmed: Option<bool>,
        #[arg(long)]
        distributed: Option<bool>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List subscriptions of a project or of an investor.
    List {
        #[arg(long, required_unless_present = "investor", conflicts_with = "investor")]
        project: Option<String>,
        #[arg(long)]
        investor: Option<String>,
    },
    /// Delete a subscription and its allocations.
    Delete { id: String },
}
