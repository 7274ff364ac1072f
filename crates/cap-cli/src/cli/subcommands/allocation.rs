use clap::Subcommand;

/// Token allocation commands.
#[derive(Clone, Debug, Subcommand)]
pub enum AllocationCommands {
    /// Allocate tokens to a subscription.
    Add {
        #[arg(long)]
        subscription: String,
        #[arg(long)]
        amount: f64,
        #[arg(long = "token")]
        token_type: String,
    },
    /// Update an allocation.
    Update {
        id: String,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long = "token")]
        token_type: Option<String>,
        /// Mark distributed now with this transaction hash.
        #[arg(long)]
        distributed_tx: Option<String>,
    },
    /// List allocations of a subscription.
    List {
        #[arg(long)]
        subscription: String,
    },
}
