mod activity;
mod allocation;
mod investor;
mod project;
mod subscription;
mod wallet;

pub use activity::{ActivityCommands, ActivityFilterArgs};
pub use allocation::AllocationCommands;
pub use investor::InvestorCommands;
pub use project::{ProjectCommands, ProjectFieldArgs};
pub use subscription::SubscriptionCommands;
pub use wallet::WalletCommands;
