use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{SignatoryStatus, WalletStatus};

/// A multi-signature wallet that receives or distributes tokens.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct MultiSigWallet {
    pub id: String,
    /// On-chain address. Unique across wallets.
    pub address: String,
    pub name: String,
    pub required_signatures: u32,
    pub status: WalletStatus,
    pub activated_at: Option<DateTime<Utc>>,
    pub blocked_at: Option<DateTime<Utc>>,
    pub block_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewWallet {
    pub address: String,
    pub name: String,
    pub required_signatures: u32,
}

impl NewWallet {
    /// A wallet needing a single signature.
    #[must_use]
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            required_signatures: 1,
        }
    }
}

/// A key holder on a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct WalletSignatory {
    pub id: String,
    pub wallet_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: SignatoryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewSignatory {
    pub name: String,
    pub email: String,
    pub role: String,
}

/// A destination address the wallet may send to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct WhitelistEntry {
    pub id: String,
    pub wallet_id: String,
    pub address: String,
    pub label: Option<String>,
    /// Email of the actor who added the address.
    pub added_by: Option<String>,
    pub added_at: DateTime<Utc>,
}
