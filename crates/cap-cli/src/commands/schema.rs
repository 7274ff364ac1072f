use cap_core::entities::{
    ActivityEntry, CapTable, Investor, InvestorGroup, MultiSigWallet, Project, RedemptionApprover,
    RedemptionRequest, Subscription, SubscriptionWithAllocations, TokenAllocation, WalletSignatory,
    WhitelistEntry,
};
use schemars::{Schema, schema_for};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

/// Entity names accepted by `capt schema`.
pub const SCHEMA_NAMES: &[&str] = &[
    "project",
    "cap_table",
    "investor",
    "investor_group",
    "subscription",
    "subscription_with_allocations",
    "token_allocation",
    "redemption_request",
    "redemption_approver",
    "multi_sig_wallet",
    "wallet_signatory",
    "whitelist_entry",
    "activity_entry",
];

fn schema_by_name(name: &str) -> Option<Schema> {
    let schema = match name.replace('-', "_").as_str() {
        "project" => schema_for!(Project),
        "cap_table" => schema_for!(CapTable),
        "investor" => schema_for!(Investor),
        "investor_group" => schema_for!(InvestorGroup),
        "subscription" => schema_for!(Subscription),
        "subscription_with_allocations" => schema_for!(SubscriptionWithAllocations),
        "token_allocation" => schema_for!(TokenAllocation),
        "redemption_request" => schema_for!(RedemptionRequest),
        "redemption_approver" => schema_for!(RedemptionApprover),
        "multi_sig_wallet" => schema_for!(MultiSigWallet),
        "wallet_signatory" => schema_for!(WalletSignatory),
        "whitelist_entry" => schema_for!(WhitelistEntry),
        "activity_entry" => schema_for!(ActivityEntry),
        _ => return None,
    };
    Some(schema)
}

/// Handle `capt schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = schema_by_name(&args.entity).ok_or_else(|| {
        anyhow::anyhow!(
            "unknown entity '{}'; expected one of: {}",
            args.entity,
            SCHEMA_NAMES.join(", ")
        )
    })?;
    output(&schema, flags.format)
}
