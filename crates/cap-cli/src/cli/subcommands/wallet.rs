use clap::Subcommand;

/// Multi-signature wallet commands.
#[derive(Clone, Debug, Subcommand)]
pub enum WalletCommands {
    /// Register a wallet. It starts pending.
    Create {
        #[arg(long)]
        address: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 1)]
        required_signatures: u32,
    },
    /// Show a wallet by its address, with signatories and whitelist.
    Status { address: String },
    /// List wallets by name.
    List,
    /// Activate a wallet.
    Activate { id: String },
    /// Block a wallet.
    Block {
        id: String,
        #[arg(long)]
        reason: String,
    },
    /// Add a signatory.
    AddSigner {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "signer")]
        role: String,
    },
    /// Remove a signatory.
    RemoveSigner { id: String, signatory_id: String },
    /// Whitelist a destination address.
    Allow {
        id: String,
        address: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Remove an address from the whitelist.
    Disallow { id: String, address: String },
    /// Delete a wallet with its signatories and whitelist.
    Delete { id: String },
}
