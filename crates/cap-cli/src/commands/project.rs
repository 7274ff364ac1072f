use cap_core::entities::NewProject;
use cap_core::enums::{EntityKind, Permission, ProjectStatus};
use cap_core::identity::EntityRef;
use cap_db::updates::project::{ProjectUpdate, ProjectUpdateBuilder};
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{ProjectCommands, ProjectFieldArgs};
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `capt project`.
pub async fn handle(
    action: &ProjectCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ProjectCommands::Create {
            name,
            project_type,
            fields,
        } => {
            let new = new_project(name, project_type, fields)?;
            let cap = ctx.grant_kind(Permission::Create, EntityKind::Project)?;
            let (project, cap_table) = ctx.service.create_project(&cap, new).await?;
            output(&json!({ "project": project, "cap_table": cap_table }), flags.format)
        }
        ProjectCommands::Update {
            id,
            name,
            project_type,
            fields,
        } => {
            let update = project_update(name.as_deref(), project_type.as_deref(), fields)?;
            let cap = ctx.grant_on(Permission::Update, EntityRef::project(id))?;
            let project = ctx.service.update_project(&cap, id, update).await?;
            output(&project, flags.format)
        }
        ProjectCommands::Get { id } => {
            let project = ctx.service.get_project(id).await?;
            let cap_table = ctx.service.get_project_cap_table(id).await?;
            let investors = ctx.service.list_project_investors(id).await?;
            output(
                &json!({ "project": project, "cap_table": cap_table, "investors": investors }),
                flags.format,
            )
        }
        ProjectCommands::List { limit } => {
            let limit = effective_limit(*limit, flags.limit, ctx.config.general.default_limit);
            let projects = ctx.service.list_projects(limit).await?;
            output(&projects, flags.format)
        }
        ProjectCommands::Stats { id } => {
            let stats = ctx.service.project_statistics(id).await?;
            output(&stats, flags.format)
        }
        ProjectCommands::Delete { id } => {
            let cap = ctx.grant_on(Permission::Delete, EntityRef::project(id))?;
            let report = ctx.service.delete_project(&cap, id).await?;
            output(&report, flags.format)
        }
    }
}

fn new_project(
    name: &str,
    project_type: &str,
    fields: &ProjectFieldArgs,
) -> anyhow::Result<NewProject> {
    let mut new = NewProject::draft(name, project_type);
    if let Some(status) = fields.status.as_deref() {
        new.status = parse_enum::<ProjectStatus>(status, "status")?;
    }
    new.description.clone_from(&fields.description);
    new.token_symbol.clone_from(&fields.token_symbol);
    new.target_raise = fields.target_raise.unwrap_or_default();
    new.authorized_shares = fields.authorized_shares.unwrap_or_default();
    new.share_price = fields.share_price.unwrap_or_default();
    new.company_valuation = fields.company_valuation;
    new.funding_round.clone_from(&fields.funding_round);
    new.legal_entity.clone_from(&fields.legal_entity);
    new.jurisdiction.clone_from(&fields.jurisdiction);
    new.tax_id.clone_from(&fields.tax_id);
    Ok(new)
}

fn project_update(
    name: Option<&str>,
    project_type: Option<&str>,
    fields: &ProjectFieldArgs,
) -> anyhow::Result<ProjectUpdate> {
    if name.is_none() && project_type.is_none() && fields.is_empty() {
        anyhow::bail!("At least one field to update must be provided");
    }

    let mut builder = ProjectUpdateBuilder::new();
    if let Some(name) = name {
        builder = builder.name(name);
    }
    if let Some(project_type) = project_type {
        builder = builder.project_type(project_type);
    }
    if let Some(status) = fields.status.as_deref() {
        builder = builder.status(parse_enum::<ProjectStatus>(status, "status")?);
    }
    if let Some(description) = fields.description.clone() {
        builder = builder.description(Some(description));
    }
    if let Some(token_symbol) = fields.token_symbol.clone() {
        builder = builder.token_symbol(Some(token_symbol));
    }
    if let Some(target_raise) = fields.target_raise {
        builder = builder.target_raise(target_raise);
    }
    if let Some(authorized_shares) = fields.authorized_shares {
        builder = builder.authorized_shares(authorized_shares);
    }
    if let Some(share_price) = fields.share_price {
        builder = builder.share_price(share_price);
    }
    if let Some(company_valuation) = fields.company_valuation {
        builder = builder.company_valuation(Some(company_valuation));
    }
    if let Some(funding_round) = fields.funding_round.clone() {
        builder = builder.funding_round(Some(funding_round));
    }
    if let Some(legal_entity) = fields.legal_entity.clone() {
        builder = builder.legal_entity(Some(legal_entity));
    }
    if let Some(jurisdiction) = fields.jurisdiction.clone() {
        builder = builder.jurisdiction(Some(jurisdiction));
    }
    if let Some(tax_id) = fields.tax_id.clone() {
        builder = builder.tax_id(Some(tax_id));
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use cap_core::enums::ProjectStatus;

    use super::{new_project, project_update};
    use crate::cli::subcommands::ProjectFieldArgs;

    #[test]
    fn rejects_noop_update() {
        assert!(project_update(None, None, &ProjectFieldArgs::default()).is_err());
    }

    #[test]
    fn update_carries_only_given_fields() {
        let fields = ProjectFieldArgs {
            share_price: Some(1.25),
            ..Default::default()
        };
        let update = project_update(Some("Aurora Prime"), None, &fields).unwrap();
        assert_eq!(update.name.as_deref(), Some("Aurora Prime"));
        assert_eq!(update.share_price, Some(1.25));
        assert!(update.project_type.is_none());
        assert!(update.description.is_none());
    }

    #[test]
    fn create_defaults_to_draft() {
        let new = new_project("Aurora", "token", &ProjectFieldArgs::default()).unwrap();
        assert_eq!(new.status, ProjectStatus::Draft);
        assert_eq!(new.target_raise, 0.0);

        let fields = ProjectFieldArgs {
            status: Some("bogus".into()),
            ..Default::default()
        };
        assert!(new_project("Aurora", "token", &fields).is_err());
    }
}
