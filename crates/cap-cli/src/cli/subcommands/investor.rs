use clap::Subcommand;

/// Investor commands.
#[derive(Clone, Debug, Subcommand)]
pub enum InvestorCommands {
    /// Create an investor.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// individual, institutional, corporate, ...
        #[arg(long = "type", default_value = "individual")]
        investor_type: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        wallet: Option<String>,
    },
    /// Update an investor's profile.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long = "type")]
        investor_type: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        wallet: Option<String>,
    },
    /// Change an investor's KYC status.
    Kyc {
        id: String,
        /// not_started, pending, approved, failed, expired
        #[arg(long)]
        status: String,
        /// Expiry date (YYYY-MM-DD or RFC 3339).
        #[arg(long)]
        expires: Option<String>,
        /// Verification details as a JSON object.
        #[arg(long)]
        details: Option<String>,
    },
    /// Get an investor with their subscriptions.
    Get { id: String },
    /// List investors by name.
    List {
        #[arg(long)]
        kyc_status: Option<String>,
        /// Only approved investors whose KYC expires within this many days.
        #[arg(long, conflicts_with = "kyc_status")]
        expiring_within: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Delete an investor and everything that depends on them.
    Delete { id: String },
}
