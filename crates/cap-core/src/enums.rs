//! Status enums, entity kinds, roles and permissions.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for SQL storage.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! impl_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of an issuance project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Draft,
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }
}

// ---------------------------------------------------------------------------
// KycStatus
// ---------------------------------------------------------------------------

/// Identity-verification status of an investor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    NotStarted,
    Pending,
    Approved,
    Failed,
    Expired,
}

impl KycStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

// ---------------------------------------------------------------------------
// RedemptionStatus
// ---------------------------------------------------------------------------

/// Status of a token redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
    Processing,
    Completed,
}

impl RedemptionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processing => "processing",
            Self::Completed => "completed",
        }
    }
}

// ---------------------------------------------------------------------------
// WalletStatus / SignatoryStatus
// ---------------------------------------------------------------------------

/// Whether a multi-signature wallet may be used for distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WalletStatus {
    Pending,
    Active,
    Blocked,
}

impl WalletStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }
}

/// A signatory is pending until they confirm their key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignatoryStatus {
    Pending,
    Active,
}

impl SignatoryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityStatus
// ---------------------------------------------------------------------------

/// Outcome recorded on an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Success,
    Failure,
    Pending,
}

impl ActivityStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Pending => "pending",
        }
    }
}

// ---------------------------------------------------------------------------
// ActivityTab
// ---------------------------------------------------------------------------

/// Activity-monitor tab. Each tab narrows the `action` column to a family
/// of patterns; see [`crate::activity::tab_patterns`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityTab {
    #[default]
    All,
    Auth,
    Data,
    Admin,
}

impl ActivityTab {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Auth => "auth",
            Self::Data => "data",
            Self::Admin => "admin",
        }
    }
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Kind of stored entity. Used for capability scopes, activity entries and
/// cascade roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    CapTable,
    Investor,
    InvestorGroup,
    Subscription,
    TokenAllocation,
    RedemptionRequest,
    MultiSigWallet,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::CapTable => "cap_table",
            Self::Investor => "investor",
            Self::InvestorGroup => "investor_group",
            Self::Subscription => "subscription",
            Self::TokenAllocation => "token_allocation",
            Self::RedemptionRequest => "redemption_request",
            Self::MultiSigWallet => "multi_sig_wallet",
        }
    }

    /// SQL table backing this kind.
    ///
    /// Exhaustive match: adding a variant forces updating this.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::CapTable => "cap_tables",
            Self::Investor => "investors",
            Self::InvestorGroup => "investor_groups",
            Self::Subscription => "subscriptions",
            Self::TokenAllocation => "token_allocations",
            Self::RedemptionRequest => "redemption_requests",
            Self::MultiSigWallet => "multi_sig_wallets",
        }
    }
}

// ---------------------------------------------------------------------------
// Role / Permission
// ---------------------------------------------------------------------------

/// Role of an acting user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Compliance,
    #[default]
    Viewer,
}

impl Role {
    /// Built-in permissions for this role. `identity::RolePolicy` starts
    /// from these and can be overridden in config.
    #[must_use]
    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Admin => &[
                Permission::Create,
                Permission::Update,
                Permission::Delete,
                Permission::ManageKyc,
            ],
            Self::Manager => &[Permission::Create, Permission::Update],
            Self::Compliance => &[Permission::Update, Permission::ManageKyc],
            Self::Viewer => &[],
        }
    }

    #[must_use]
    pub fn allows(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Compliance => "compliance",
            Self::Viewer => "viewer",
        }
    }
}

/// A mutation a capability can authorize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Create,
    Update,
    Delete,
    ManageKyc,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::ManageKyc => "manage_kyc",
        }
    }
}

impl_display!(
    ProjectStatus,
    KycStatus,
    RedemptionStatus,
    WalletStatus,
    SignatoryStatus,
    ActivityStatus,
    ActivityTab,
    EntityKind,
    Role,
    Permission,
);
