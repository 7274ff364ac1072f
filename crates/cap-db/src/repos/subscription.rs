//! Subscription repository: adding investors to projects, reads joined
//! with projects and allocations, partial updates, cascade delete.

use chrono::Utc;
use tracing::info;

use cap_core::entities::{
    Investor, NewActivity, NewSubscription, Subscription, SubscriptionWithAllocations,
};
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::{Capability, EntityRef};
use cap_core::ids::{PREFIX_CAP_TABLE_INVESTOR, PREFIX_SUBSCRIPTION};

use crate::cascade::CascadeReport;
use crate::error::DatabaseError;
use crate::helpers::{
    SetClause, format_timestamp, get_bool, get_opt_string, now_micros, opt_value, parse_datetime,
    qualify, to_storage_precision,
};
use crate::repos::investor::{self, row_to_investor};
use crate::service::{CapService, authorize, authorize_create, finish};
use crate::updates::subscription::SubscriptionUpdate;

const SELECT_COLS: &str = "id, investor_id, project_id, subscription_ref, currency, fiat_amount, subscription_date, confirmed, allocated, distributed, notes, created_at, updated_at";

fn row_to_subscription(row: &libsql::Row) -> Result<Subscription, DatabaseError> {
    Ok(Subscription {
        id: row.get(0)?,
        investor_id: row.get(1)?,
        project_id: row.get(2)?,
        subscription_ref: row.get(3)?,
        currency: row.get(4)?,
        fiat_amount: row.get(5)?,
        subscription_date: parse_datetime(&row.get::<String>(6)?)?,
        confirmed: get_bool(row, 7)?,
        allocated: get_bool(row, 8)?,
        distributed: get_bool(row, 9)?,
        notes: get_opt_string(row, 10)?,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        updated_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

fn subscription_activity(action: &str, subscription: &Subscription) -> NewActivity {
    NewActivity {
        entity_type: Some(EntityKind::Subscription.as_str().into()),
        entity_id: Some(subscription.id.clone()),
        project_id: Some(subscription.project_id.clone()),
        ..NewActivity::new(action)
    }
}

impl CapService {
    /// Subscribe an investor to a project and link them to the project's
    /// cap table, in one transaction.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Forbidden` without a kind-wide `create` capability
    ///   for subscriptions
    /// - `DatabaseError::NotFound` if the project, its cap table or the
    ///   investor does not exist
    /// - `DatabaseError::InvalidState` for a negative amount
    pub async fn add_investor_to_project(
        &self,
        cap: &Capability,
        project_id: &str,
        investor_id: &str,
        new: NewSubscription,
    ) -> Result<Subscription, DatabaseError> {
        authorize_create(cap, EntityKind::Subscription)?;
        if new.fiat_amount < 0.0 {
            return Err(DatabaseError::InvalidState(format!(
                "subscription amount must not be negative: {}",
                new.fiat_amount
            )));
        }
        self.get_project(project_id).await?;
        let cap_table = self.get_project_cap_table(project_id).await?;
        self.get_investor(investor_id).await?;

        let now = now_micros();
        let subscription = Subscription {
            id: self.db().generate_id(PREFIX_SUBSCRIPTION).await?,
            investor_id: investor_id.to_string(),
            project_id: project_id.to_string(),
            subscription_ref: new.subscription_ref,
            currency: new.currency,
            fiat_amount: new.fiat_amount,
            subscription_date: to_storage_precision(new.subscription_date),
            confirmed: new.confirmed,
            allocated: new.allocated,
            distributed: new.distributed,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        let link_id = self.db().generate_id(PREFIX_CAP_TABLE_INVESTOR).await?;

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO subscriptions ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"),
                libsql::params![
                    subscription.id.as_str(),
                    subscription.investor_id.as_str(),
                    subscription.project_id.as_str(),
                    subscription.subscription_ref.as_str(),
                    subscription.currency.as_str(),
                    subscription.fiat_amount,
                    format_timestamp(subscription.subscription_date),
                    i64::from(subscription.confirmed),
                    i64::from(subscription.allocated),
                    i64::from(subscription.distributed),
                    subscription.notes.as_deref(),
                    format_timestamp(now),
                    format_timestamp(now)
                ],
            )
            .await?;
            tx.execute(
                "INSERT OR IGNORE INTO cap_table_investors (id, cap_table_id, investor_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                libsql::params![
                    link_id.as_str(),
                    cap_table.id.as_str(),
                    investor_id,
                    format_timestamp(now)
                ],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                subscription_activity("create_subscriptions", &subscription),
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        info!(
            subscription = %subscription.id,
            project = project_id,
            investor = investor_id,
            "investor added to project"
        );
        Ok(subscription)
    }

    pub async fn get_subscription(&self, id: &str) -> Result<Subscription, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM subscriptions WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("subscription", id))?;
        row_to_subscription(&row)
    }

    /// An investor's subscriptions with project names and allocations,
    /// newest subscription first.
    pub async fn list_investor_subscriptions(
        &self,
        investor_id: &str,
    ) -> Result<Vec<SubscriptionWithAllocations>, DatabaseError> {
        let sql = format!(
            "SELECT {}, p.name FROM subscriptions s JOIN projects p ON p.id = s.project_id
             WHERE s.investor_id = ?1 ORDER BY s.subscription_date DESC, s.rowid DESC",
            qualify(SELECT_COLS, "s")
        );
        let mut rows = self.db().conn().query(&sql, [investor_id]).await?;
        let mut joined = Vec::new();
        while let Some(row) = rows.next().await? {
            joined.push((row_to_subscription(&row)?, row.get::<String>(13)?));
        }

        let mut result = Vec::with_capacity(joined.len());
        for (subscription, project_name) in joined {
            let allocations = self.list_token_allocations(&subscription.id).await?;
            result.push(SubscriptionWithAllocations {
                subscription,
                project_name,
                allocations,
            });
        }
        Ok(result)
    }

    /// Subscriptions to one project, newest first.
    pub async fn list_project_subscriptions(
        &self,
        project_id: &str,
    ) -> Result<Vec<Subscription>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM subscriptions WHERE project_id = ?1
                     ORDER BY subscription_date DESC, rowid DESC"
                ),
                [project_id],
            )
            .await?;
        let mut subscriptions = Vec::new();
        while let Some(row) = rows.next().await? {
            subscriptions.push(row_to_subscription(&row)?);
        }
        Ok(subscriptions)
    }

    /// Investors on the project's cap table, by name.
    pub async fn list_project_investors(
        &self,
        project_id: &str,
    ) -> Result<Vec<Investor>, DatabaseError> {
        let sql = format!(
            "SELECT DISTINCT {} FROM investors i
             JOIN cap_table_investors cti ON cti.investor_id = i.id
             JOIN cap_tables c ON c.id = cti.cap_table_id
             WHERE c.project_id = ?1 ORDER BY i.name ASC, i.id ASC",
            qualify(investor::SELECT_COLS, "i")
        );
        let mut rows = self.db().conn().query(&sql, [project_id]).await?;
        let mut investors = Vec::new();
        while let Some(row) = rows.next().await? {
            investors.push(row_to_investor(&row)?);
        }
        Ok(investors)
    }

    pub async fn update_subscription(
        &self,
        cap: &Capability,
        id: &str,
        update: SubscriptionUpdate,
    ) -> Result<Subscription, DatabaseError> {
        authorize(cap, Permission::Update, &EntityRef::subscription(id))?;
        let current = self.get_subscription(id).await?;

        let mut clause = SetClause::new();
        if let Some(ref subscription_ref) = update.subscription_ref {
            clause.set("subscription_ref", subscription_ref.clone());
        }
        if let Some(ref currency) = update.currency {
            clause.set("currency", currency.clone());
        }
        if let Some(fiat_amount) = update.fiat_amount {
            if fiat_amount < 0.0 {
                return Err(DatabaseError::InvalidState(format!(
                    "subscription amount must not be negative: {fiat_amount}"
                )));
            }
            clause.set("fiat_amount", fiat_amount);
        }
        if let Some(subscription_date) = update.subscription_date {
            clause.set("subscription_date", format_timestamp(subscription_date));
        }
        if let Some(confirmed) = update.confirmed {
            clause.set("confirmed", i64::from(confirmed));
        }
        if let Some(allocated) = update.allocated {
            clause.set("allocated", i64::from(allocated));
        }
        if let Some(distributed) = update.distributed {
            clause.set("distributed", i64::from(distributed));
        }
        if let Some(ref notes) = update.notes {
            clause.set("notes", opt_value(notes.clone()));
        }

        if clause.is_empty() {
            return Ok(current);
        }
        clause.set("updated_at", format_timestamp(Utc::now()));
        let (sql, params) = clause.into_update("subscriptions", id);
        let details =
            serde_json::to_string(&update).map_err(|e| DatabaseError::Other(e.into()))?;

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(&sql, libsql::params_from_iter(params)).await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    details: Some(details),
                    ..subscription_activity("update_subscriptions", &current)
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;
        self.get_subscription(id).await
    }

    /// Delete a subscription and its token allocations.
    pub async fn delete_subscription(
        &self,
        cap: &Capability,
        id: &str,
    ) -> Result<CascadeReport, DatabaseError> {
        self.delete_entity(cap, &EntityRef::subscription(id)).await
    }
}
