use std::path::PathBuf;

use cap_core::enums::{ActivityStatus, ActivityTab};
use cap_db::repos::activity::ActivityQuery;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{ActivityCommands, ActivityFilterArgs};
use crate::commands::shared::parse::{DayBound, parse_datetime, parse_enum};
use crate::context::AppContext;
use crate::output::output;

/// Handle `capt activity`.
pub async fn handle(
    action: &ActivityCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ActivityCommands::List { filter, page } => {
            let query = build_query(filter, *page, ctx.config.activity.page_size)?;
            let page = ctx.service.list_activity(&query).await?;
            output(&page, flags.format)
        }
        ActivityCommands::Export { filter, page, dir } => {
            let query = build_query(filter, *page, ctx.config.activity.page_size)?;
            let dir = dir
                .as_deref()
                .map_or_else(|| PathBuf::from(&ctx.config.activity.export_dir), PathBuf::from);
            let written = ctx.service.export_activity(&query, &dir).await?;
            if written.is_none() && !flags.quiet {
                eprintln!("no activity matched; nothing exported");
            }
            output(
                &json!({ "exported": written.is_some(), "path": written }),
                flags.format,
            )
        }
    }
}

fn build_query(
    filter: &ActivityFilterArgs,
    page: Option<u32>,
    default_page_size: u32,
) -> anyhow::Result<ActivityQuery> {
    let page_size = filter.page_size.unwrap_or(default_page_size);
    if page_size == 0 {
        anyhow::bail!("--page-size must be at least 1");
    }

    Ok(ActivityQuery {
        tab: filter
            .tab
            .as_deref()
            .map(|tab| parse_enum::<ActivityTab>(tab, "tab"))
            .transpose()?
            .unwrap_or_default(),
        action: filter.action.clone(),
        entity_type: filter.entity_type.clone(),
        status: filter
            .status
            .as_deref()
            .map(|status| parse_enum::<ActivityStatus>(status, "status"))
            .transpose()?,
        start: filter
            .from
            .as_deref()
            .map(|raw| parse_datetime(raw, "from", DayBound::Start))
            .transpose()?,
        end: filter
            .to
            .as_deref()
            .map(|raw| parse_datetime(raw, "to", DayBound::End))
            .transpose()?,
        search: filter.search.clone().filter(|s| !s.trim().is_empty()),
        page: page.unwrap_or(1),
        page_size,
    })
}

#[cfg(test)]
mod tests {
    use cap_core::enums::{ActivityStatus, ActivityTab};
    use pretty_assertions::assert_eq;

    use super::build_query;
    use crate::cli::subcommands::ActivityFilterArgs;

    #[test]
    fn defaults_to_first_page_of_all() {
        let query = build_query(&ActivityFilterArgs::default(), None, 20).unwrap();
        assert_eq!(query.tab, ActivityTab::All);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 20);
        assert!(query.status.is_none());
    }

    #[test]
    fn filters_are_parsed() {
        let filter = ActivityFilterArgs {
            tab: Some("auth".into()),
            status: Some("failure".into()),
            from: Some("2026-01-01".into()),
            to: Some("2026-01-31".into()),
            search: Some("  ".into()),
            page_size: Some(5),
            ..Default::default()
        };
        let query = build_query(&filter, Some(3), 20).unwrap();
        assert_eq!(query.tab, ActivityTab::Auth);
        assert_eq!(query.status, Some(ActivityStatus::Failure));
        assert!(query.start < query.end);
        assert!(query.search.is_none());
        assert_eq!((query.page, query.page_size), (3, 5));
    }

    #[test]
    fn rejects_bad_values() {
        let bad_tab = ActivityFilterArgs {
            tab: Some("billing".into()),
            ..Default::default()
        };
        assert!(build_query(&bad_tab, None, 20).is_err());

        let zero = ActivityFilterArgs {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(build_query(&zero, None, 20).is_err());
    }
}
