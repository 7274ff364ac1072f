use cap_core::entities::NewAllocation;
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::EntityRef;
use cap_db::updates::allocation::AllocationUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AllocationCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capt allocation`.
pub async fn handle(
    action: &AllocationCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AllocationCommands::Add {
            subscription,
            amount,
            token_type,
        } => {
            let cap = ctx.grant_kind(Permission::Create, EntityKind::TokenAllocation)?;
            let allocation = ctx
                .service
                .add_token_allocation(
                    &cap,
                    subscription,
                    NewAllocation::undistributed(*amount, token_type),
                )
                .await?;
            output(&allocation, flags.format)
        }
        AllocationCommands::Update {
            id,
            amount,
            token_type,
            distributed_tx,
        } => {
            if amount.is_none() && token_type.is_none() && distributed_tx.is_none() {
                anyhow::bail!(
                    "At least one of --amount, --token, or --distributed-tx must be provided"
                );
            }
            let mut builder = AllocationUpdateBuilder::new();
            if let Some(amount) = amount {
                builder = builder.token_amount(*amount);
            }
            if let Some(token_type) = token_type {
                builder = builder.token_type(token_type);
            }
            if let Some(tx_hash) = distributed_tx {
                builder = builder.distributed_with(tx_hash);
            }
            let cap = ctx.grant_on(
                Permission::Update,
                EntityRef::new(EntityKind::TokenAllocation, id),
            )?;
            let allocation = ctx
                .service
                .update_token_allocation(&cap, id, builder.build())
                .await?;
            output(&allocation, flags.format)
        }
        AllocationCommands::List { subscription } => {
            let allocations = ctx.service.list_token_allocations(subscription).await?;
            output(&allocations, flags.format)
        }
    }
}
