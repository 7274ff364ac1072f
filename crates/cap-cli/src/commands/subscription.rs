use cap_core::entities::NewSubscription;
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::EntityRef;
use cap_db::updates::subscription::SubscriptionUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SubscriptionCommands;
use crate::commands::shared::parse::{DayBound, parse_datetime};
use crate::context::AppContext;
use crate::output::output;

/// Handle `capt subscription`.
pub async fn handle(
    action: &SubscriptionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SubscriptionCommands::Add {
            project,
            investor,
            reference,
            currency,
            amount,
            date,
            confirmed,
            notes,
        } => {
            let mut new = NewSubscription::new(reference, currency, *amount);
            if let Some(date) = date.as_deref() {
                new.subscription_date = parse_datetime(date, "date", DayBound::Start)?;
            }
            new.confirmed = *confirmed;
            new.notes.clone_from(notes);
            let cap = ctx.grant_kind(Permission::Create, EntityKind::Subscription)?;
            let subscription = ctx
                .service
                .add_investor_to_project(&cap, project, investor, new)
                .await?;
            output(&subscription, flags.format)
        }
        SubscriptionCommands::Update {
            id,
            reference,
            currency,
            amount,
            date,
            confirmed,
            distributed,
            notes,
        } => {
            let mut builder = SubscriptionUpdateBuilder::new();
            let mut any = false;
            if let Some(reference) = reference {
                builder = builder.subscription_ref(reference);
                any = true;
            }
            if let Some(currency) = currency {
                builder = builder.currency(currency);
                any = true;
            }
            if let Some(amount) = amount {
                builder = builder.fiat_amount(*amount);
                any = true;
            }
            if let Some(date) = date.as_deref() {
                builder = builder.subscription_date(parse_datetime(date, "date", DayBound::Start)?);
                any = true;
            }
            if let Some(confirmed) = confirmed {
                builder = builder.confirmed(*confirmed);
                any = true;
            }
            if let Some(distributed) = distributed {
                builder = builder.distributed(*distributed);
                any = true;
            }
            if let Some(notes) = notes {
                builder = builder.notes(Some(notes.clone()));
                any = true;
            }
            if !any {
                anyhow::bail!("At least one field to update must be provided");
            }
            let cap = ctx.grant_on(Permission::Update, EntityRef::subscription(id))?;
            let subscription = ctx
                .service
                .update_subscription(&cap, id, builder.build())
                .await?;
            output(&subscription, flags.format)
        }
        SubscriptionCommands::List { project, investor } => {
            if let Some(investor) = investor {
                let subscriptions = ctx.service.list_investor_subscriptions(investor).await?;
                output(&subscriptions, flags.format)
            } else if let Some(project) = project {
                let subscriptions = ctx.service.list_project_subscriptions(project).await?;
                output(&subscriptions, flags.format)
            } else {
                anyhow::bail!("one of --project or --investor is required")
            }
        }
        SubscriptionCommands::Delete { id } => {
            let cap = ctx.grant_on(Permission::Delete, EntityRef::subscription(id))?;
            let report = ctx.service.delete_subscription(&cap, id).await?;
            output(&report, flags.format)
        }
    }
}
