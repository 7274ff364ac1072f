use cap_core::entities::NewInvestor;
use cap_core::enums::{EntityKind, KycStatus, Permission};
use cap_core::identity::EntityRef;
use cap_db::updates::investor::{InvestorUpdateBuilder, KycUpdate};
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::InvestorCommands;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::{DayBound, parse_datetime, parse_enum, parse_json_object};
use crate::context::AppContext;
use crate::output::output;

/// Handle `capt investor`.
pub async fn handle(
    action: &InvestorCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        InvestorCommands::Create {
            name,
            email,
            investor_type,
            company,
            wallet,
        } => {
            let new = NewInvestor {
                name: name.clone(),
                email: email.clone(),
                investor_type: investor_type.clone(),
                company: company.clone(),
                wallet_address: wallet.clone(),
            };
            let cap = ctx.grant_kind(Permission::Create, EntityKind::Investor)?;
            let investor = ctx.service.create_investor(&cap, new).await?;
            output(&investor, flags.format)
        }
        InvestorCommands::Update {
            id,
            name,
            email,
            investor_type,
            company,
            wallet,
        } => {
            if name.is_none()
                && email.is_none()
                && investor_type.is_none()
                && company.is_none()
                && wallet.is_none()
            {
                anyhow::bail!(
                    "At least one of --name, --email, --type, --company, or --wallet must be provided"
                );
            }
            let mut builder = InvestorUpdateBuilder::new();
            if let Some(name) = name {
                builder = builder.name(name);
            }
            if let Some(email) = email {
                builder = builder.email(email);
            }
            if let Some(investor_type) = investor_type {
                builder = builder.investor_type(investor_type);
            }
            if let Some(company) = company {
                builder = builder.company(Some(company.clone()));
            }
            if let Some(wallet) = wallet {
                builder = builder.wallet_address(Some(wallet.clone()));
            }
            let cap = ctx.grant_on(Permission::Update, EntityRef::investor(id))?;
            let investor = ctx.service.update_investor(&cap, id, builder.build()).await?;
            output(&investor, flags.format)
        }
        InvestorCommands::Kyc {
            id,
            status,
            expires,
            details,
        } => {
            let update = kyc_update(status, expires.as_deref(), details.as_deref())?;
            let cap = ctx.grant_on(Permission::ManageKyc, EntityRef::investor(id))?;
            let investor = ctx.service.update_investor_kyc(&cap, id, update).await?;
            output(&investor, flags.format)
        }
        InvestorCommands::Get { id } => {
            let investor = ctx.service.get_investor(id).await?;
            let subscriptions = ctx.service.list_investor_subscriptions(id).await?;
            let redemptions = ctx.service.list_redemption_requests(id).await?;
            output(
                &json!({
                    "investor": investor,
                    "subscriptions": subscriptions,
                    "redemption_requests": redemptions,
                }),
                flags.format,
            )
        }
        InvestorCommands::List {
            kyc_status,
            expiring_within,
            limit,
        } => {
            let limit = effective_limit(*limit, flags.limit, ctx.config.general.default_limit);
            let investors = if let Some(days) = expiring_within {
                let mut investors = ctx.service.list_investors_with_expiring_kyc(*days).await?;
                investors.truncate(usize::try_from(limit)?);
                investors
            } else if let Some(status) = kyc_status.as_deref() {
                let status = parse_enum::<KycStatus>(status, "kyc status")?;
                ctx.service.list_investors_by_kyc_status(status, limit).await?
            } else {
                ctx.service.list_investors(limit).await?
            };
            output(&investors, flags.format)
        }
        InvestorCommands::Delete { id } => {
            let cap = ctx.grant_on(Permission::Delete, EntityRef::investor(id))?;
            let report = ctx.service.delete_investor(&cap, id).await?;
            output(&report, flags.format)
        }
    }
}

fn kyc_update(
    status: &str,
    expires: Option<&str>,
    details: Option<&str>,
) -> anyhow::Result<KycUpdate> {
    let mut update = KycUpdate::status(parse_enum::<KycStatus>(status, "kyc status")?);
    if let Some(expires) = expires {
        update = update.expiring(parse_datetime(expires, "expiry date", DayBound::End)?);
    }
    if let Some(details) = details {
        update = update.with_details(parse_json_object(details, "verification details")?);
    }
    Ok(update)
}
