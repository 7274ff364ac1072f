use cap_core::entities::{NewSignatory, NewWallet};
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::EntityRef;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::WalletCommands;
use crate::context::AppContext;
use crate::output::output;

fn wallet(id: &str) -> EntityRef {
    EntityRef::new(EntityKind::MultiSigWallet, id)
}

/// Handle `capt wallet`.
pub async fn handle(
    action: &WalletCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        WalletCommands::Create {
            address,
            name,
            required_signatures,
        } => {
            let new = NewWallet {
                required_signatures: *required_signatures,
                ..NewWallet::new(address.as_str(), name.as_str())
            };
            let cap = ctx.grant_kind(Permission::Create, EntityKind::MultiSigWallet)?;
            let wallet = ctx.service.create_wallet(&cap, new).await?;
            output(&wallet, flags.format)
        }
        WalletCommands::Status { address } => {
            let wallet = ctx.service.get_wallet_status(address).await?;
            let signatories = ctx.service.list_signatories(&wallet.id).await?;
            let whitelist = ctx.service.list_whitelist(&wallet.id).await?;
            output(
                &json!({
                    "wallet": wallet,
                    "signatories": signatories,
                    "whitelist": whitelist,
                }),
                flags.format,
            )
        }
        WalletCommands::List => output(&ctx.service.list_wallets().await?, flags.format),
        WalletCommands::Activate { id } => {
            let cap = ctx.grant_on(Permission::Update, wallet(id))?;
            output(&ctx.service.activate_wallet(&cap, id).await?, flags.format)
        }
        WalletCommands::Block { id, reason } => {
            let cap = ctx.grant_on(Permission::Update, wallet(id))?;
            output(&ctx.service.block_wallet(&cap, id, reason).await?, flags.format)
        }
        WalletCommands::AddSigner {
            id,
            name,
            email,
            role,
        } => {
            let new = NewSignatory {
                name: name.clone(),
                email: email.clone(),
                role: role.clone(),
            };
            let cap = ctx.grant_on(Permission::Update, wallet(id))?;
            output(&ctx.service.add_signatory(&cap, id, new).await?, flags.format)
        }
        WalletCommands::RemoveSigner { id, signatory_id } => {
            let cap = ctx.grant_on(Permission::Update, wallet(id))?;
            ctx.service.remove_signatory(&cap, id, signatory_id).await?;
            output(&json!({ "removed": signatory_id }), flags.format)
        }
        WalletCommands::Allow { id, address, label } => {
            let cap = ctx.grant_on(Permission::Update, wallet(id))?;
            let entry = ctx
                .service
                .add_to_whitelist(&cap, id, address, label.as_deref())
                .await?;
            output(&entry, flags.format)
        }
        WalletCommands::Disallow { id, address } => {
            let cap = ctx.grant_on(Permission::Update, wallet(id))?;
            let removed = ctx.service.remove_from_whitelist(&cap, id, address).await?;
            output(&json!({ "address": address, "removed": removed }), flags.format)
        }
        WalletCommands::Delete { id } => {
            let cap = ctx.grant_on(Permission::Delete, wallet(id))?;
            output(&ctx.service.delete_wallet(&cap, id).await?, flags.format)
        }
    }
}
