//! Activity log: append, filtered and paginated reads, CSV export.
//!
//! Rows are append-only; the schema's triggers abort any UPDATE or DELETE.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use cap_core::activity::{export_csv, export_file_name, filter_search, tab_patterns};
use cap_core::entities::{ActivityEntry, NewActivity};
use cap_core::enums::{ActivityStatus, ActivityTab};
use cap_core::identity::Actor;
use cap_core::ids::PREFIX_ACTIVITY;

use crate::error::DatabaseError;
use crate::helpers::{format_timestamp, get_opt_string, now_micros, parse_datetime, parse_enum};
use crate::service::CapService;

const SELECT_COLS: &str = "id, timestamp, user_id, user_email, action, entity_type, entity_id, project_id, details, status";

fn row_to_activity(row: &libsql::Row) -> Result<ActivityEntry, DatabaseError> {
    Ok(ActivityEntry {
        id: row.get(0)?,
        timestamp: parse_datetime(&row.get::<String>(1)?)?,
        user_id: get_opt_string(row, 2)?,
        user_email: get_opt_string(row, 3)?,
        action: row.get(4)?,
        entity_type: get_opt_string(row, 5)?,
        entity_id: get_opt_string(row, 6)?,
        project_id: get_opt_string(row, 7)?,
        details: get_opt_string(row, 8)?,
        status: parse_enum(&row.get::<String>(9)?)?,
    })
}

/// Filters for [`CapService::list_activity`]. All set filters must match.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    pub tab: ActivityTab,
    /// Exact action name.
    pub action: Option<String>,
    pub entity_type: Option<String>,
    pub status: Option<ActivityStatus>,
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
    /// Free-text needle, applied to the fetched page.
    pub search: Option<String>,
    /// 1-based page number. `0` is treated as `1`.
    pub page: u32,
    pub page_size: u32,
}

/// One page of activity, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityPage {
    pub entries: Vec<ActivityEntry>,
    pub page: u32,
    pub page_size: u32,
    /// At least one row exists beyond this page.
    pub has_more: bool,
    /// Distinct actions among the fetched rows.
    pub actions: Vec<String>,
    /// Distinct entity types among the fetched rows.
    pub entity_types: Vec<String>,
}

impl ActivityQuery {
    fn where_clause(&self) -> (String, Vec<libsql::Value>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref action) = self.action {
            params.push(action.clone().into());
            conditions.push(format!("action = ?{}", params.len()));
        }
        if let Some(ref entity_type) = self.entity_type {
            params.push(entity_type.clone().into());
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(status) = self.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(start) = self.start {
            params.push(format_timestamp(start).into());
            conditions.push(format!("timestamp >= ?{}", params.len()));
        }
        if let Some(end) = self.end {
            params.push(format_timestamp(end).into());
            conditions.push(format!("timestamp <= ?{}", params.len()));
        }

        let patterns = tab_patterns(self.tab);
        if !patterns.is_empty() {
            let alternatives: Vec<String> = patterns
                .iter()
                .map(|p| {
                    params.push(p.like_pattern().into());
                    format!("lower(action) LIKE ?{} ESCAPE '\\'", params.len())
                })
                .collect();
            conditions.push(format!("({})", alternatives.join(" OR ")));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

impl CapService {
    /// Append an activity entry on `conn` (which may be an open transaction).
    /// The actor fills `user_id` and `user_email` when the entry has none.
    pub(crate) async fn insert_activity(
        &self,
        conn: &libsql::Connection,
        actor: Option<&Actor>,
        new: NewActivity,
    ) -> Result<ActivityEntry, DatabaseError> {
        let id = self.db().generate_id(PREFIX_ACTIVITY).await?;
        let entry = ActivityEntry {
            id,
            timestamp: now_micros(),
            user_id: new.user_id.or_else(|| actor.map(|a| a.user_id.clone())),
            user_email: new.user_email.or_else(|| actor.map(|a| a.email.clone())),
            action: new.action,
            entity_type: new.entity_type,
            entity_id: new.entity_id,
            project_id: new.project_id,
            details: new.details,
            status: new.status.unwrap_or(ActivityStatus::Success),
        };

        conn.execute(
            &format!("INSERT INTO audit_logs ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
            libsql::params![
                entry.id.as_str(),
                format_timestamp(entry.timestamp),
                entry.user_id.as_deref(),
                entry.user_email.as_deref(),
                entry.action.as_str(),
                entry.entity_type.as_deref(),
                entry.entity_id.as_deref(),
                entry.project_id.as_deref(),
                entry.details.as_deref(),
                entry.status.as_str()
            ],
        )
        .await?;
        Ok(entry)
    }

    /// Append an entry that did not come from a capability-checked mutation
    /// (e.g. `auth_login` recorded by the caller).
    pub async fn log_activity(&self, new: NewActivity) -> Result<ActivityEntry, DatabaseError> {
        self.insert_activity(self.db().conn(), None, new).await
    }

    pub async fn get_activity(&self, id: &str) -> Result<ActivityEntry, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM audit_logs WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("activity", id))?;
        row_to_activity(&row)
    }

    /// One page of activity matching `query`, newest first.
    ///
    /// SQL filters narrow the rows; one row past the page is fetched to set
    /// `has_more`. The free-text search then runs over the page only, so a
    /// page may hold fewer than `page_size` entries while `has_more` is true.
    pub async fn list_activity(&self, query: &ActivityQuery) -> Result<ActivityPage, DatabaseError> {
        let page = query.page.max(1);
        let page_size = query.page_size.max(1);
        let (clause, mut params) = query.where_clause();

        params.push((i64::from(page_size) + 1).into());
        let limit_idx = params.len();
        params.push(((i64::from(page) - 1) * i64::from(page_size)).into());
        let offset_idx = params.len();

        let sql = format!(
            "SELECT {SELECT_COLS} FROM audit_logs {clause}
             ORDER BY timestamp DESC, rowid DESC LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_activity(&row)?);
        }

        let has_more = entries.len() > page_size as usize;
        entries.truncate(page_size as usize);

        let actions: BTreeSet<String> = entries.iter().map(|e| e.action.clone()).collect();
        let entity_types: BTreeSet<String> =
            entries.iter().filter_map(|e| e.entity_type.clone()).collect();

        let entries = match query.search.as_deref() {
            Some(needle) => filter_search(entries, needle),
            None => entries,
        };

        Ok(ActivityPage {
            entries,
            page,
            page_size,
            has_more,
            actions: actions.into_iter().collect(),
            entity_types: entity_types.into_iter().collect(),
        })
    }

    /// Most recent entries about one entity.
    pub async fn entity_activity(
        &self,
        entity_type: &str,
        entity_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityEntry>, DatabaseError> {
        self.query_activity(
            &format!(
                "SELECT {SELECT_COLS} FROM audit_logs WHERE entity_type = ?1 AND entity_id = ?2
                 ORDER BY timestamp DESC, rowid DESC LIMIT ?3"
            ),
            libsql::params![entity_type, entity_id, i64::from(limit)],
        )
        .await
    }

    /// Most recent entries recorded for one user.
    pub async fn user_recent_activity(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<ActivityEntry>, DatabaseError> {
        self.query_activity(
            &format!(
                "SELECT {SELECT_COLS} FROM audit_logs WHERE user_id = ?1
                 ORDER BY timestamp DESC, rowid DESC LIMIT ?2"
            ),
            libsql::params![user_id, i64::from(limit)],
        )
        .await
    }

    /// Write the query's current page to `<dir>/activity_logs_<date>.csv`.
    /// Returns `None` without touching the filesystem when the page is empty.
    pub async fn export_activity(
        &self,
        query: &ActivityQuery,
        dir: &Path,
    ) -> Result<Option<PathBuf>, DatabaseError> {
        let page = self.list_activity(query).await?;
        let csv = export_csv(&page.entries);
        if csv.is_empty() {
            return Ok(None);
        }
        let path = dir.join(export_file_name(Utc::now().date_naive()));
        tokio::fs::write(&path, csv)
            .await
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Some(path))
    }

    async fn query_activity(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<ActivityEntry>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_activity(&row)?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::test_service;
    use pretty_assertions::assert_eq;

    async fn seed(svc: &CapService, action: &str, entity_id: &str) -> ActivityEntry {
        svc.log_activity(NewActivity {
            entity_type: Some("investor".into()),
            entity_id: Some(entity_id.into()),
            user_email: Some("ops@example.com".into()),
            ..NewActivity::new(action)
        })
        .await
        .unwrap()
    }

    fn query(page: u32, page_size: u32) -> ActivityQuery {
        ActivityQuery {
            page,
            page_size,
            ..ActivityQuery::default()
        }
    }

    #[tokio::test]
    async fn log_and_get_round_trip() {
        let svc = test_service().await;
        let entry = seed(&svc, "create_investors", "inv-1").await;
        let fetched = svc.get_activity(&entry.id).await.unwrap();
        assert_eq!(fetched.action, "create_investors");
        assert_eq!(fetched.status, ActivityStatus::Success);
        assert_eq!(fetched.user_email.as_deref(), Some("ops@example.com"));
    }

    #[tokio::test]
    async fn pages_newest_first_with_has_more() {
        let svc = test_service().await;
        for i in 0..5 {
            seed(&svc, "update_investors", &format!("inv-{i}")).await;
        }

        let first = svc.list_activity(&query(1, 2)).await.unwrap();
        assert_eq!(first.entries.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.entries[0].entity_id.as_deref(), Some("inv-4"));

        let last = svc.list_activity(&query(3, 2)).await.unwrap();
        assert_eq!(last.entries.len(), 1);
        assert!(!last.has_more);
    }

    #[tokio::test]
    async fn exact_multiple_has_no_phantom_page() {
        let svc = test_service().await;
        for i in 0..4 {
            seed(&svc, "update_investors", &format!("inv-{i}")).await;
        }
        let second = svc.list_activity(&query(2, 2)).await.unwrap();
        assert_eq!(second.entries.len(), 2);
        assert!(!second.has_more);
    }

    #[tokio::test]
    async fn tab_filter_treats_underscore_literally() {
        let svc = test_service().await;
        seed(&svc, "auth_login", "usr-1").await;
        seed(&svc, "authxlogin", "usr-2").await;
        seed(&svc, "delete_projects", "prj-1").await;

        let auth = svc
            .list_activity(&ActivityQuery {
                tab: ActivityTab::Auth,
                ..query(1, 20)
            })
            .await
            .unwrap();
        let actions: Vec<_> = auth.entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["auth_login"]);

        let data = svc
            .list_activity(&ActivityQuery {
                tab: ActivityTab::Data,
                ..query(1, 20)
            })
            .await
            .unwrap();
        assert_eq!(data.entries.len(), 1);
        assert_eq!(data.actions, vec!["delete_projects".to_string()]);
    }

    #[tokio::test]
    async fn filters_are_conjunctive() {
        let svc = test_service().await;
        seed(&svc, "update_investors", "inv-1").await;
        svc.log_activity(NewActivity {
            status: Some(ActivityStatus::Failure),
            entity_type: Some("investor".into()),
            ..NewActivity::new("update_investors")
        })
        .await
        .unwrap();

        let page = svc
            .list_activity(&ActivityQuery {
                action: Some("update_investors".into()),
                status: Some(ActivityStatus::Failure),
                ..query(1, 20)
            })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].status, ActivityStatus::Failure);
    }

    #[tokio::test]
    async fn time_range_is_inclusive() {
        let svc = test_service().await;
        let entry = seed(&svc, "update_investors", "inv-1").await;

        let page = svc
            .list_activity(&ActivityQuery {
                start: Some(entry.timestamp),
                end: Some(entry.timestamp),
                ..query(1, 20)
            })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 1);

        let before = svc
            .list_activity(&ActivityQuery {
                end: Some(entry.timestamp - chrono::Duration::seconds(1)),
                ..query(1, 20)
            })
            .await
            .unwrap();
        assert!(before.entries.is_empty());
    }

    #[tokio::test]
    async fn search_runs_over_fetched_page() {
        let svc = test_service().await;
        seed(&svc, "update_investors", "inv-7f3a9c01").await;
        seed(&svc, "update_investors", "inv-00000000").await;

        let page = svc
            .list_activity(&ActivityQuery {
                search: Some("7F3A".into()),
                ..query(1, 20)
            })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].entity_id.as_deref(), Some("inv-7f3a9c01"));

        let none = svc
            .list_activity(&ActivityQuery {
                search: Some("no-such-token".into()),
                ..query(1, 20)
            })
            .await
            .unwrap();
        assert!(none.entries.is_empty());
    }

    #[tokio::test]
    async fn entity_and_user_history() {
        let svc = test_service().await;
        seed(&svc, "create_investors", "inv-1").await;
        seed(&svc, "update_investors", "inv-1").await;
        seed(&svc, "update_investors", "inv-2").await;
        svc.log_activity(NewActivity {
            user_id: Some("usr-9".into()),
            ..NewActivity::new("auth_login")
        })
        .await
        .unwrap();

        let history = svc.entity_activity("investor", "inv-1", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action, "update_investors");

        let user = svc.user_recent_activity("usr-9", 10).await.unwrap();
        assert_eq!(user.len(), 1);
    }

    #[tokio::test]
    async fn export_writes_dated_file() {
        let svc = test_service().await;
        seed(&svc, "update_investors", "inv-1").await;
        let dir = tempfile::tempdir().unwrap();

        let path = svc
            .export_activity(&query(1, 20), dir.path())
            .await
            .unwrap()
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("activity_logs_") && name.ends_with(".csv"));
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("Timestamp,User,Action"));
    }

    #[tokio::test]
    async fn export_of_empty_page_writes_nothing() {
        let svc = test_service().await;
        let dir = tempfile::tempdir().unwrap();
        let path = svc.export_activity(&query(1, 20), dir.path()).await.unwrap();
        assert!(path.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
