//! Cascading deletes driven by a declared dependency table.
//!
//! Every foreign key that points at a deletable row is listed once in
//! [`DEPENDENCY_EDGES`]. [`CascadePlan`] walks those edges depth-first from a
//! root table: ids are discovered in pre-order, rows are deleted in
//! post-order, so children always go before their parents.
//!
//! The walk runs against a [`CascadeStore`]. In production that is the
//! libSQL connection of an open transaction, so a fatal failure at any step
//! rolls back every step before it.

use async_trait::async_trait;
use cap_core::entities::NewActivity;
use cap_core::enums::{ActivityStatus, EntityKind, Permission};
use cap_core::identity::{Capability, EntityRef};
use libsql::Value;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::helpers::placeholders;
use crate::service::{CapService, authorize, finish};

/// What happens when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgePolicy {
    /// Abort the cascade and roll back.
    Fatal,
    /// Log, record in the report and carry on. Inherited by every edge
    /// below a best-effort edge.
    BestEffort,
}

/// `table.foreign_key` references `parent_table.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub table: &'static str,
    pub foreign_key: &'static str,
    pub parent_table: &'static str,
    pub policy: EdgePolicy,
}

const fn edge(
    table: &'static str,
    foreign_key: &'static str,
    parent_table: &'static str,
    policy: EdgePolicy,
) -> DependencyEdge {
    DependencyEdge {
        table,
        foreign_key,
        parent_table,
        policy,
    }
}

/// All dependency edges. Order among siblings is deletion order.
pub const DEPENDENCY_EDGES: &[DependencyEdge] = &[
    edge("subscriptions", "project_id", "projects", EdgePolicy::Fatal),
    edge("cap_tables", "project_id", "projects", EdgePolicy::Fatal),
    edge("cap_table_investors", "cap_table_id", "cap_tables", EdgePolicy::Fatal),
    edge("subscriptions", "investor_id", "investors", EdgePolicy::Fatal),
    edge("redemption_requests", "investor_id", "investors", EdgePolicy::BestEffort),
    edge("cap_table_investors", "investor_id", "investors", EdgePolicy::Fatal),
    edge("investor_groups_investors", "investor_id", "investors", EdgePolicy::Fatal),
    edge("investor_groups_investors", "group_id", "investor_groups", EdgePolicy::Fatal),
    edge("token_allocations", "subscription_id", "subscriptions", EdgePolicy::Fatal),
    edge("redemption_approvers", "redemption_id", "redemption_requests", EdgePolicy::Fatal),
    edge("wallet_signatories", "wallet_id", "multi_sig_wallets", EdgePolicy::Fatal),
    edge("wallet_whitelist", "wallet_id", "multi_sig_wallets", EdgePolicy::Fatal),
];

/// One table visited by a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    pub table: &'static str,
    /// Column matched against the parent step's ids; `id` for the root.
    pub column: &'static str,
    /// Index of the parent step in [`CascadePlan::steps`].
    pub parent: Option<usize>,
    /// Effective policy after inheritance.
    pub policy: EdgePolicy,
    has_children: bool,
}

/// Depth-first expansion of the dependency edges below one root table.
#[derive(Debug, Clone)]
pub struct CascadePlan {
    steps: Vec<PlanStep>,
    deletion_order: Vec<usize>,
}

impl CascadePlan {
    /// Plan over [`DEPENDENCY_EDGES`].
    #[must_use]
    pub fn for_table(root: &'static str) -> Self {
        Self::build(root, DEPENDENCY_EDGES)
    }

    /// Plan over an explicit edge list. An edge leading back to a table
    /// already on the current path is not followed.
    #[must_use]
    pub fn build(root: &'static str, edges: &[DependencyEdge]) -> Self {
        let mut plan = Self {
            steps: Vec::new(),
            deletion_order: Vec::new(),
        };
        let mut path = vec![root];
        plan.visit(edges, root, "id", None, EdgePolicy::Fatal, &mut path);
        plan
    }

    fn visit(
        &mut self,
        edges: &[DependencyEdge],
        table: &'static str,
        column: &'static str,
        parent: Option<usize>,
        policy: EdgePolicy,
        path: &mut Vec<&'static str>,
    ) {
        let index = self.steps.len();
        self.steps.push(PlanStep {
            table,
            column,
            parent,
            policy,
            has_children: false,
        });

        for child in edges.iter().filter(|e| e.parent_table == table) {
            if path.contains(&child.table) {
                continue;
            }
            self.steps[index].has_children = true;
            let child_policy = match policy {
                EdgePolicy::BestEffort => EdgePolicy::BestEffort,
                EdgePolicy::Fatal => child.policy,
            };
            path.push(child.table);
            self.visit(
                edges,
                child.table,
                child.foreign_key,
                Some(index),
                child_policy,
                path,
            );
            path.pop();
        }

        self.deletion_order.push(index);
    }

    /// Steps in discovery (pre-) order; index 0 is the root.
    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// Steps in deletion (post-) order; the root comes last.
    pub fn deletion_order(&self) -> impl Iterator<Item = &PlanStep> {
        self.deletion_order.iter().map(|&i| &self.steps[i])
    }

    #[must_use]
    pub fn tables_in_deletion_order(&self) -> Vec<&'static str> {
        self.deletion_order().map(|s| s.table).collect()
    }
}

/// Rows deleted from one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedRows {
    pub table: String,
    pub rows: u64,
}

/// A best-effort step that failed and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub table: String,
    pub reason: String,
}

/// Outcome of a committed cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub root: EntityRef,
    /// Per-table counts in execution order.
    pub deleted: Vec<DeletedRows>,
    pub skipped: Vec<SkippedStep>,
}

impl CascadeReport {
    fn new(root: EntityRef) -> Self {
        Self {
            root,
            deleted: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Rows deleted from `table` across all steps that touched it.
    #[must_use]
    pub fn rows_deleted(&self, table: &str) -> u64 {
        self.deleted
            .iter()
            .filter(|d| d.table == table)
            .map(|d| d.rows)
            .sum()
    }

    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.deleted.iter().map(|d| d.rows).sum()
    }
}

/// Storage operations a cascade needs.
#[async_trait]
pub trait CascadeStore: Send + Sync {
    /// `SELECT id FROM {table} WHERE {column} IN (keys)`.
    async fn select_ids(
        &self,
        table: &str,
        column: &str,
        keys: &[String],
    ) -> Result<Vec<String>, DatabaseError>;

    /// `DELETE FROM {table} WHERE {column} IN (keys)`, returning rows affected.
    async fn delete_where_in(
        &self,
        table: &str,
        column: &str,
        keys: &[String],
    ) -> Result<u64, DatabaseError>;
}

/// Keys bound per statement; well under `SQLite`'s variable limit.
const MAX_IN_PARAMS: usize = 500;

fn key_params(keys: &[String]) -> Vec<Value> {
    keys.iter().map(|k| Value::from(k.clone())).collect()
}

#[async_trait]
impl CascadeStore for libsql::Connection {
    async fn select_ids(
        &self,
        table: &str,
        column: &str,
        keys: &[String],
    ) -> Result<Vec<String>, DatabaseError> {
        let mut ids = Vec::new();
        for chunk in keys.chunks(MAX_IN_PARAMS) {
            let sql = format!(
                "SELECT id FROM {table} WHERE {column} IN ({})",
                placeholders(1, chunk.len())
            );
            let mut rows = self
                .query(&sql, libsql::params_from_iter(key_params(chunk)))
                .await?;
            while let Some(row) = rows.next().await? {
                ids.push(row.get::<String>(0)?);
            }
        }
        Ok(ids)
    }

    async fn delete_where_in(
        &self,
        table: &str,
        column: &str,
        keys: &[String],
    ) -> Result<u64, DatabaseError> {
        let mut deleted = 0;
        for chunk in keys.chunks(MAX_IN_PARAMS) {
            let sql = format!(
                "DELETE FROM {table} WHERE {column} IN ({})",
                placeholders(1, chunk.len())
            );
            deleted += self
                .execute(&sql, libsql::params_from_iter(key_params(chunk)))
                .await?;
        }
        Ok(deleted)
    }
}

/// Execute `plan` for `root` against `store`.
///
/// Returns the first fatal error without running later steps. The caller
/// owns the transaction and must roll back on `Err`.
///
/// # Errors
///
/// Returns the first fatal step error, or `DatabaseError::NotFound` if the
/// root row does not exist.
pub async fn run_cascade(
    store: &dyn CascadeStore,
    plan: &CascadePlan,
    root: &EntityRef,
) -> Result<CascadeReport, DatabaseError> {
    let steps = plan.steps();
    let mut ids: Vec<Vec<String>> = vec![Vec::new(); steps.len()];
    let mut skipped = vec![false; steps.len()];
    ids[0].push(root.id.clone());
    let mut report = CascadeReport::new(root.clone());

    for (index, step) in steps.iter().enumerate().skip(1) {
        let parent = step.parent.unwrap_or(0);
        if skipped[parent] {
            skipped[index] = true;
            continue;
        }
        if !step.has_children || ids[parent].is_empty() {
            continue;
        }
        let found = store.select_ids(step.table, step.column, &ids[parent]).await;
        match found {
            Ok(found) => {
                debug!(table = step.table, count = found.len(), "cascade: discovered");
                ids[index] = found;
            }
            Err(error) if step.policy == EdgePolicy::BestEffort => {
                warn!(table = step.table, %error, "cascade: skipping best-effort step");
                report.skipped.push(SkippedStep {
                    table: step.table.to_string(),
                    reason: error.to_string(),
                });
                skipped[index] = true;
            }
            Err(error) => return Err(error),
        }
    }

    for &index in &plan.deletion_order {
        let step = &steps[index];
        if skipped[index] {
            continue;
        }
        let (column, keys) = match step.parent {
            Some(parent) => (step.column, &ids[parent]),
            None => ("id", &ids[0]),
        };
        if keys.is_empty() {
            report.deleted.push(DeletedRows {
                table: step.table.to_string(),
                rows: 0,
            });
            continue;
        }
        let result = store.delete_where_in(step.table, column, keys).await;
        match result {
            Ok(rows) => {
                if step.parent.is_none() && rows == 0 {
                    return Err(DatabaseError::not_found(root.kind.as_str(), &root.id));
                }
                debug!(table = step.table, rows, "cascade: deleted");
                report.deleted.push(DeletedRows {
                    table: step.table.to_string(),
                    rows,
                });
            }
            Err(error) if step.policy == EdgePolicy::BestEffort => {
                warn!(table = step.table, %error, "cascade: skipping best-effort step");
                report.skipped.push(SkippedStep {
                    table: step.table.to_string(),
                    reason: error.to_string(),
                });
            }
            Err(error) => return Err(error),
        }
    }

    Ok(report)
}

impl CapService {
    /// Delete `target` and every row that depends on it, in one transaction.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Forbidden` if `cap` does not cover deleting `target`
    /// - `DatabaseError::NotFound` if the row does not exist
    /// - the first fatal step error; nothing is deleted in that case
    pub async fn delete_entity(
        &self,
        cap: &Capability,
        target: &EntityRef,
    ) -> Result<CascadeReport, DatabaseError> {
        authorize(cap, Permission::Delete, target)?;
        let plan = CascadePlan::for_table(target.kind.table());
        let action = format!("delete_{}", target.kind.table());

        let tx = self.begin_immediate().await?;
        let result: Result<CascadeReport, DatabaseError> = async {
            let store: &libsql::Connection = &tx;
            let report = run_cascade(store, &plan, target).await?;
            let details = serde_json::to_string(&report.deleted)
                .map_err(|e| DatabaseError::Other(e.into()))?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    details: Some(details),
                    ..cascade_activity(&action, target)
                },
            )
            .await?;
            Ok(report)
        }
        .await;

        match finish(tx, result).await {
            Ok(report) => {
                info!(
                    root = %target,
                    rows = report.total_rows(),
                    skipped = report.skipped.len(),
                    "cascade delete committed"
                );
                Ok(report)
            }
            Err(error) => {
                let entry = NewActivity {
                    details: Some(error.to_string()),
                    status: Some(ActivityStatus::Failure),
                    ..cascade_activity(&action, target)
                };
                if let Err(log_error) = self
                    .insert_activity(self.db().conn(), Some(cap.actor()), entry)
                    .await
                {
                    warn!(%log_error, "failed to record cascade failure");
                }
                Err(error)
            }
        }
    }
}

fn cascade_activity(action: &str, target: &EntityRef) -> NewActivity {
    NewActivity {
        entity_type: Some(target.kind.as_str().to_string()),
        entity_id: Some(target.id.clone()),
        project_id: (target.kind == EntityKind::Project)
            .then(|| target.id.clone()),
        ..NewActivity::new(action)
    }
}
