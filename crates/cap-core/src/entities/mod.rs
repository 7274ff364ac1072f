//! Entity structs for all captable domain objects.
//!
//! Each entity maps to a table in the libSQL database. `New*` structs carry
//! the caller-supplied fields for inserts; IDs and timestamps are assigned by
//! the repository.

mod activity;
mod investor;
mod project;
mod redemption;
mod subscription;
mod wallet;

pub use activity::{ActivityEntry, NewActivity};
pub use investor::{Investor, InvestorGroup, InvestorGroupMember, NewInvestor};
pub use project::{CapTable, CapTableInvestor, NewProject, Project, ProjectStatistics};
pub use redemption::{NewRedemption, RedemptionApprover, RedemptionRequest};
pub use subscription::{
    NewAllocation, NewSubscription, Subscription, SubscriptionWithAllocations, TokenAllocation,
};
pub use wallet::{MultiSigWallet, NewSignatory, NewWallet, WalletSignatory, WhitelistEntry};
