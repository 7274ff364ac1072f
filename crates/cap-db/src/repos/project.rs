//! Project repository: creation with its cap table, partial updates with
//! cap-table rename propagation, statistics, cascade delete.

use chrono::Utc;
use tracing::{debug, info, warn};

use cap_core::entities::{CapTable, NewActivity, NewProject, Project, ProjectStatistics};
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::{Capability, EntityRef};
use cap_core::ids::{PREFIX_CAP_TABLE, PREFIX_PROJECT, cap_table_name};

use crate::cascade::CascadeReport;
use crate::error::DatabaseError;
use crate::helpers::{
    SetClause, format_timestamp, get_opt_string, now_micros, opt_value, parse_datetime,
    parse_enum,
};
use crate::service::{CapService, authorize, authorize_create, finish};
use crate::updates::project::ProjectUpdate;

const SELECT_COLS: &str = "id, name, description, status, project_type, token_symbol, target_raise, authorized_shares, share_price, company_valuation, funding_round, legal_entity, jurisdiction, tax_id, created_at, updated_at";

const CAP_TABLE_COLS: &str = "id, project_id, name, created_at, updated_at";

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        description: get_opt_string(row, 2)?,
        status: parse_enum(&row.get::<String>(3)?)?,
        project_type: row.get(4)?,
        token_symbol: get_opt_string(row, 5)?,
        target_raise: row.get(6)?,
        authorized_shares: row.get(7)?,
        share_price: row.get(8)?,
        company_valuation: row.get::<Option<f64>>(9)?,
        funding_round: get_opt_string(row, 10)?,
        legal_entity: get_opt_string(row, 11)?,
        jurisdiction: get_opt_string(row, 12)?,
        tax_id: get_opt_string(row, 13)?,
        created_at: parse_datetime(&row.get::<String>(14)?)?,
        updated_at: parse_datetime(&row.get::<String>(15)?)?,
    })
}

fn row_to_cap_table(row: &libsql::Row) -> Result<CapTable, DatabaseError> {
    Ok(CapTable {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
        updated_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

/// The unique index is the backstop for a name claimed between the
/// pre-check and the insert.
fn map_duplicate_name(error: libsql::Error, name: &str) -> DatabaseError {
    if error.to_string().contains("UNIQUE constraint failed: projects.name") {
        DatabaseError::DuplicateName {
            name: name.to_string(),
        }
    } else {
        DatabaseError::Backend(error)
    }
}

impl CapService {
    /// Create a project and its cap table (`"Cap Table - {name}"`) in one
    /// transaction. If the cap table cannot be created the project insert
    /// is rolled back.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Forbidden` without a kind-wide `create` capability
    /// - `DatabaseError::DuplicateName` if the name is taken; nothing is written
    /// - the insert error of either row
    pub async fn create_project(
        &self,
        cap: &Capability,
        new: NewProject,
    ) -> Result<(Project, CapTable), DatabaseError> {
        authorize_create(cap, EntityKind::Project)?;
        if new.name.trim().is_empty() {
            return Err(DatabaseError::InvalidState(
                "project name must not be empty".into(),
            ));
        }
        if self.project_name_taken(&new.name, None).await? {
            return Err(DatabaseError::DuplicateName { name: new.name });
        }

        let now = now_micros();
        let project = Project {
            id: self.db().generate_id(PREFIX_PROJECT).await?,
            name: new.name,
            description: new.description,
            status: new.status,
            project_type: new.project_type,
            token_symbol: new.token_symbol,
            target_raise: new.target_raise,
            authorized_shares: new.authorized_shares,
            share_price: new.share_price,
            company_valuation: new.company_valuation,
            funding_round: new.funding_round,
            legal_entity: new.legal_entity,
            jurisdiction: new.jurisdiction,
            tax_id: new.tax_id,
            created_at: now,
            updated_at: now,
        };
        let cap_table = CapTable {
            id: self.db().generate_id(PREFIX_CAP_TABLE).await?,
            project_id: project.id.clone(),
            name: cap_table_name(&project.name),
            created_at: now,
            updated_at: now,
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO projects ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"),
                libsql::params![
                    project.id.as_str(),
                    project.name.as_str(),
                    project.description.as_deref(),
                    project.status.as_str(),
                    project.project_type.as_str(),
                    project.token_symbol.as_deref(),
                    project.target_raise,
                    project.authorized_shares,
                    project.share_price,
                    project.company_valuation,
                    project.funding_round.as_deref(),
                    project.legal_entity.as_deref(),
                    project.jurisdiction.as_deref(),
                    project.tax_id.as_deref(),
                    format_timestamp(now),
                    format_timestamp(now)
                ],
            )
            .await
            .map_err(|e| map_duplicate_name(e, &project.name))?;

            tx.execute(
                &format!("INSERT INTO cap_tables ({CAP_TABLE_COLS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
                libsql::params![
                    cap_table.id.as_str(),
                    cap_table.project_id.as_str(),
                    cap_table.name.as_str(),
                    format_timestamp(now),
                    format_timestamp(now)
                ],
            )
            .await?;

            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    entity_type: Some(EntityKind::Project.as_str().into()),
                    entity_id: Some(project.id.clone()),
                    project_id: Some(project.id.clone()),
                    details: Some(project.name.clone()),
                    ..NewActivity::new("create_projects")
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        info!(project = %project.id, name = %project.name, "project created");
        Ok((project, cap_table))
    }

    pub async fn get_project(&self, id: &str) -> Result<Project, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM projects WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("project", id))?;
        row_to_project(&row)
    }

    /// Newest first.
    pub async fn list_projects(&self, limit: u32) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM projects ORDER BY created_at DESC, rowid DESC LIMIT ?1"
                ),
                [i64::from(limit)],
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }

    /// The project's cap table.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` (entity `cap_table`) if the project
    /// has none.
    pub async fn get_project_cap_table(&self, project_id: &str) -> Result<CapTable, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {CAP_TABLE_COLS} FROM cap_tables WHERE project_id = ?1"),
                [project_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("cap_table", project_id))?;
        row_to_cap_table(&row)
    }

    /// Apply a partial update. When the name changes, the cap table follows
    /// if it still carries the generated name for the old project name.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Forbidden` if `cap` does not cover updating `id`
    /// - `DatabaseError::NotFound` for an unknown id
    /// - `DatabaseError::DuplicateName` if another project has the new name
    pub async fn update_project(
        &self,
        cap: &Capability,
        id: &str,
        update: ProjectUpdate,
    ) -> Result<Project, DatabaseError> {
        authorize(cap, Permission::Update, &EntityRef::project(id))?;
        let current = self.get_project(id).await?;

        let renamed_to = update.name.as_deref().filter(|name| *name != current.name);
        if let Some(new_name) = renamed_to {
            if self.project_name_taken(new_name, Some(id)).await? {
                return Err(DatabaseError::DuplicateName {
                    name: new_name.to_string(),
                });
            }
        }

        let mut clause = SetClause::new();
        if let Some(ref name) = update.name {
            clause.set("name", name.clone());
        }
        if let Some(ref description) = update.description {
            clause.set("description", opt_value(description.clone()));
        }
        if let Some(status) = update.status {
            clause.set("status", status.as_str());
        }
        if let Some(ref project_type) = update.project_type {
            clause.set("project_type", project_type.clone());
        }
        if let Some(ref token_symbol) = update.token_symbol {
            clause.set("token_symbol", opt_value(token_symbol.clone()));
        }
        if let Some(target_raise) = update.target_raise {
            clause.set("target_raise", target_raise);
        }
        if let Some(authorized_shares) = update.authorized_shares {
            clause.set("authorized_shares", authorized_shares);
        }
        if let Some(share_price) = update.share_price {
            clause.set("share_price", share_price);
        }
        if let Some(company_valuation) = update.company_valuation {
            clause.set("company_valuation", opt_value(company_valuation));
        }
        if let Some(ref funding_round) = update.funding_round {
            clause.set("funding_round", opt_value(funding_round.clone()));
        }
        if let Some(ref legal_entity) = update.legal_entity {
            clause.set("legal_entity", opt_value(legal_entity.clone()));
        }
        if let Some(ref jurisdiction) = update.jurisdiction {
            clause.set("jurisdiction", opt_value(jurisdiction.clone()));
        }
        if let Some(ref tax_id) = update.tax_id {
            clause.set("tax_id", opt_value(tax_id.clone()));
        }

        if clause.is_empty() {
            return Ok(current);
        }
        clause.set("updated_at", format_timestamp(Utc::now()));
        let (sql, params) = clause.into_update("projects", id);
        let details =
            serde_json::to_string(&update).map_err(|e| DatabaseError::Other(e.into()))?;

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(&sql, libsql::params_from_iter(params))
                .await
                .map_err(|e| map_duplicate_name(e, update.name.as_deref().unwrap_or_default()))?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    entity_type: Some(EntityKind::Project.as_str().into()),
                    entity_id: Some(id.to_string()),
                    project_id: Some(id.to_string()),
                    details: Some(details),
                    ..NewActivity::new("update_projects")
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        if let Some(new_name) = renamed_to {
            self.propagate_rename(id, &current.name, new_name).await;
        }
        self.get_project(id).await
    }

    /// Rename the cap table only if it still has the generated name.
    /// Failures are logged; the project rename stands.
    async fn propagate_rename(&self, project_id: &str, old_name: &str, new_name: &str) {
        let result = self
            .db()
            .conn()
            .execute(
                "UPDATE cap_tables SET name = ?1, updated_at = ?2 WHERE project_id = ?3 AND name = ?4",
                libsql::params![
                    cap_table_name(new_name),
                    format_timestamp(Utc::now()),
                    project_id,
                    cap_table_name(old_name)
                ],
            )
            .await;
        match result {
            Ok(0) => debug!(project = project_id, "cap table has a custom name; left unchanged"),
            Ok(_) => debug!(project = project_id, "cap table renamed"),
            Err(error) => warn!(project = project_id, %error, "failed to rename cap table"),
        }
    }

    /// Distinct subscribing investors and total fiat raised.
    pub async fn project_statistics(&self, id: &str) -> Result<ProjectStatistics, DatabaseError> {
        self.get_project(id).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(DISTINCT investor_id), COALESCE(SUM(fiat_amount), 0.0)
                 FROM subscriptions WHERE project_id = ?1",
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(ProjectStatistics {
            project_id: id.to_string(),
            investor_count: u64::try_from(row.get::<i64>(0)?).unwrap_or_default(),
            total_raised: row.get::<f64>(1)?,
        })
    }

    /// Delete a project with its subscriptions, allocations, cap table and
    /// cap-table links.
    pub async fn delete_project(
        &self,
        cap: &Capability,
        id: &str,
    ) -> Result<CascadeReport, DatabaseError> {
        self.delete_entity(cap, &EntityRef::project(id)).await
    }

    async fn project_name_taken(
        &self,
        name: &str,
        excluding: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let mut rows = match excluding {
            Some(id) => {
                self.db()
                    .conn()
                    .query(
                        "SELECT id FROM projects WHERE name = ?1 AND id != ?2",
                        [name, id],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query("SELECT id FROM projects WHERE name = ?1", [name])
                    .await?
            }
        };
        Ok(rows.next().await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{cap, cap_on, test_service};
    use crate::updates::project::ProjectUpdateBuilder;
    use cap_core::enums::ProjectStatus;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_returns_project_and_cap_table() {
        let svc = test_service().await;
        let (project, cap_table) = svc
            .create_project(
                &cap(Permission::Create, EntityKind::Project),
                NewProject::draft("Aurora", "equity"),
            )
            .await
            .unwrap();

        assert!(project.id.starts_with("prj-"));
        assert_eq!(cap_table.name, "Cap Table - Aurora");
        assert_eq!(cap_table.project_id, project.id);

        let fetched = svc.get_project(&project.id).await.unwrap();
        assert_eq!(fetched.name, "Aurora");
        assert_eq!(fetched.status, ProjectStatus::Draft);
        let stored = svc.get_project_cap_table(&project.id).await.unwrap();
        assert_eq!(stored.id, cap_table.id);
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let svc = test_service().await;
        let err = svc
            .create_project(
                &cap(Permission::Create, EntityKind::Project),
                NewProject::draft("  ", "equity"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }

    #[tokio::test]
    async fn get_unknown_project_is_not_found() {
        let svc = test_service().await;
        let err = svc.get_project("prj-missing").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let svc = test_service().await;
        let create = cap(Permission::Create, EntityKind::Project);
        for name in ["One", "Two", "Three"] {
            svc.create_project(&create, NewProject::draft(name, "equity"))
                .await
                .unwrap();
        }
        let names: Vec<_> = svc
            .list_projects(2)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Three", "Two"]);
    }

    #[tokio::test]
    async fn empty_update_returns_current_row() {
        let svc = test_service().await;
        let (project, _) = svc
            .create_project(
                &cap(Permission::Create, EntityKind::Project),
                NewProject::draft("Aurora", "equity"),
            )
            .await
            .unwrap();
        let same = svc
            .update_project(
                &cap_on(Permission::Update, EntityRef::project(&project.id)),
                &project.id,
                ProjectUpdate::default(),
            )
            .await
            .unwrap();
        assert_eq!(same, svc.get_project(&project.id).await.unwrap());
        assert_eq!(same.name, project.name);
    }

    #[tokio::test]
    async fn partial_update_touches_only_set_fields() {
        let svc = test_service().await;
        let (project, _) = svc
            .create_project(
                &cap(Permission::Create, EntityKind::Project),
                NewProject::draft("Aurora", "equity"),
            )
            .await
            .unwrap();

        let updated = svc
            .update_project(
                &cap(Permission::Update, EntityKind::Project),
                &project.id,
                ProjectUpdateBuilder::new()
                    .status(ProjectStatus::Active)
                    .share_price(1.25)
                    .token_symbol(Some("AUR".into()))
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ProjectStatus::Active);
        assert_eq!(updated.share_price, 1.25);
        assert_eq!(updated.token_symbol.as_deref(), Some("AUR"));
        assert_eq!(updated.name, "Aurora");
    }

    #[tokio::test]
    async fn statistics_of_empty_project() {
        let svc = test_service().await;
        let (project, _) = svc
            .create_project(
                &cap(Permission::Create, EntityKind::Project),
                NewProject::draft("Aurora", "equity"),
            )
            .await
            .unwrap();
        let stats = svc.project_statistics(&project.id).await.unwrap();
        assert_eq!(stats.investor_count, 0);
        assert_eq!(stats.total_raised, 0.0);
    }

    #[tokio::test]
    async fn creation_is_logged() {
        let svc = test_service().await;
        let (project, _) = svc
            .create_project(
                &cap(Permission::Create, EntityKind::Project),
                NewProject::draft("Aurora", "equity"),
            )
            .await
            .unwrap();
        let history = svc
            .entity_activity("project", &project.id, 5)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "create_projects");
        assert_eq!(history[0].user_email.as_deref(), Some("admin@example.com"));
    }
}
