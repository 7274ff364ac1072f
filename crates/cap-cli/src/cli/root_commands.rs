use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    ActivityCommands, AllocationCommands, InvestorCommands, ProjectCommands,
    SubscriptionCommands, WalletCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Projects and their cap tables.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Investors and KYC.
    Investor {
        #[command(subcommand)]
        action: InvestorCommands,
    },
    /// Investor subscriptions to projects.
    Subscription {
        #[command(subcommand)]
        action: SubscriptionCommands,
    },
    /// Token allocations.
    Allocation {
        #[command(subcommand)]
        action: AllocationCommands,
    },
    /// Multi-signature wallets.
    Wallet {
        #[command(subcommand)]
        action: WalletCommands,
    },
    /// Activity log.
    Activity {
        #[command(subcommand)]
        action: ActivityCommands,
    },
    /// Dump the JSON schema of an entity.
    Schema(SchemaArgs),
}

/// Arguments for `capt schema`.
#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Entity name, e.g. `project`, `investor`, `activity_entry`.
    pub entity: String,
}
