//! Token allocation repository.

use tracing::info;

use cap_core::entities::{NewActivity, NewAllocation, TokenAllocation};
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::{Capability, EntityRef};
use cap_core::ids::PREFIX_ALLOCATION;

use crate::error::DatabaseError;
use crate::helpers::{
    SetClause, format_timestamp, get_bool, get_opt_string, now_micros, opt_value, parse_datetime,
    parse_optional_datetime, to_storage_precision,
};
use crate::service::{CapService, authorize, authorize_create, finish};
use crate::updates::allocation::AllocationUpdate;

const SELECT_COLS: &str = "id, subscription_id, token_amount, token_type, distributed, distribution_date, distribution_tx_hash, created_at";

fn row_to_allocation(row: &libsql::Row) -> Result<TokenAllocation, DatabaseError> {
    Ok(TokenAllocation {
        id: row.get(0)?,
        subscription_id: row.get(1)?,
        token_amount: row.get(2)?,
        token_type: row.get(3)?,
        distributed: get_bool(row, 4)?,
        distribution_date: parse_optional_datetime(get_opt_string(row, 5)?.as_deref())?,
        distribution_tx_hash: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

fn allocation_activity(action: &str, allocation: &TokenAllocation, project_id: &str) -> NewActivity {
    NewActivity {
        entity_type: Some(EntityKind::TokenAllocation.as_str().into()),
        entity_id: Some(allocation.id.clone()),
        project_id: Some(project_id.to_string()),
        details: Some(format!(
            "{} {} for {}",
            allocation.token_amount, allocation.token_type, allocation.subscription_id
        )),
        ..NewActivity::new(action)
    }
}

impl CapService {
    /// Allocate tokens to a subscription and mark the subscription allocated.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Forbidden` without a kind-wide `create` capability
    ///   for allocations
    /// - `DatabaseError::NotFound` if the subscription does not exist
    /// - `DatabaseError::InvalidState` for a non-positive amount
    pub async fn add_token_allocation(
        &self,
        cap: &Capability,
        subscription_id: &str,
        new: NewAllocation,
    ) -> Result<TokenAllocation, DatabaseError> {
        authorize_create(cap, EntityKind::TokenAllocation)?;
        if new.token_amount <= 0.0 {
            return Err(DatabaseError::InvalidState(format!(
                "token amount must be positive: {}",
                new.token_amount
            )));
        }
        let subscription = self.get_subscription(subscription_id).await?;

        let now = now_micros();
        let allocation = TokenAllocation {
            id: self.db().generate_id(PREFIX_ALLOCATION).await?,
            subscription_id: subscription_id.to_string(),
            token_amount: new.token_amount,
            token_type: new.token_type,
            distributed: new.distributed,
            distribution_date: new.distribution_date.map(to_storage_precision),
            distribution_tx_hash: new.distribution_tx_hash,
            created_at: now,
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO token_allocations ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                libsql::params![
                    allocation.id.as_str(),
                    allocation.subscription_id.as_str(),
                    allocation.token_amount,
                    allocation.token_type.as_str(),
                    i64::from(allocation.distributed),
                    allocation.distribution_date.map(format_timestamp),
                    allocation.distribution_tx_hash.as_deref(),
                    format_timestamp(now)
                ],
            )
            .await?;
            tx.execute(
                "UPDATE subscriptions SET allocated = 1, updated_at = ?1 WHERE id = ?2",
                libsql::params![format_timestamp(now), subscription_id],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                allocation_activity(
                    "create_token_allocations",
                    &allocation,
                    &subscription.project_id,
                ),
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        info!(allocation = %allocation.id, subscription = subscription_id, "tokens allocated");
        Ok(allocation)
    }

    pub async fn get_token_allocation(&self, id: &str) -> Result<TokenAllocation, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM token_allocations WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("token_allocation", id))?;
        row_to_allocation(&row)
    }

    /// Allocations of one subscription, oldest first.
    pub async fn list_token_allocations(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<TokenAllocation>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM token_allocations WHERE subscription_id = ?1
                     ORDER BY created_at ASC, rowid ASC"
                ),
                [subscription_id],
            )
            .await?;
        let mut allocations = Vec::new();
        while let Some(row) = rows.next().await? {
            allocations.push(row_to_allocation(&row)?);
        }
        Ok(allocations)
    }

    pub async fn update_token_allocation(
        &self,
        cap: &Capability,
        id: &str,
        update: AllocationUpdate,
    ) -> Result<TokenAllocation, DatabaseError> {
        authorize(
            cap,
            Permission::Update,
            &EntityRef::new(EntityKind::TokenAllocation, id),
        )?;
        let current = self.get_token_allocation(id).await?;
        let subscription = self.get_subscription(&current.subscription_id).await?;

        let mut clause = SetClause::new();
        if let Some(token_amount) = update.token_amount {
            if token_amount <= 0.0 {
                return Err(DatabaseError::InvalidState(format!(
                    "token amount must be positive: {token_amount}"
                )));
            }
            clause.set("token_amount", token_amount);
        }
        if let Some(ref token_type) = update.token_type {
            clause.set("token_type", token_type.clone());
        }
        if let Some(distributed) = update.distributed {
            clause.set("distributed", i64::from(distributed));
        }
        if let Some(distribution_date) = update.distribution_date {
            clause.set(
                "distribution_date",
                opt_value(distribution_date.map(format_timestamp)),
            );
        }
        if let Some(ref tx_hash) = update.distribution_tx_hash {
            clause.set("distribution_tx_hash", opt_value(tx_hash.clone()));
        }

        if clause.is_empty() {
            return Ok(current);
        }
        let (sql, params) = clause.into_update("token_allocations", id);
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
                    ..allocation_activity(
                        "update_token_allocations",
                        &current,
                        &subscription.project_id,
                    )
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;
        self.get_token_allocation(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{cap, cap_on, test_service};
    use crate::updates::allocation::AllocationUpdateBuilder;
    use cap_core::entities::{NewInvestor, NewProject, NewSubscription};
    use pretty_assertions::assert_eq;

    async fn subscription(svc: &CapService) -> String {
        let (project, _) = svc
            .create_project(
                &cap(Permission::Create, EntityKind::Project),
                NewProject::draft("Aurora", "equity"),
            )
            .await
            .unwrap();
        let investor = svc
            .create_investor(
                &cap(Permission::Create, EntityKind::Investor),
                NewInvestor::individual("Ada", "ada@example.com"),
            )
            .await
            .unwrap();
        svc.add_investor_to_project(
            &cap(Permission::Create, EntityKind::Subscription),
            &project.id,
            &investor.id,
            NewSubscription::new("SA-001", "EUR", 1_000.0),
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn allocations_list_in_creation_order() {
        let svc = test_service().await;
        let sub_id = subscription(&svc).await;
        let create = cap(Permission::Create, EntityKind::TokenAllocation);
        for amount in [100.0, 250.0] {
            svc.add_token_allocation(&create, &sub_id, NewAllocation::undistributed(amount, "AUR"))
                .await
                .unwrap();
        }
        let amounts: Vec<_> = svc
            .list_token_allocations(&sub_id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.token_amount)
            .collect();
        assert_eq!(amounts, vec![100.0, 250.0]);
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let svc = test_service().await;
        let sub_id = subscription(&svc).await;
        let err = svc
            .add_token_allocation(
                &cap(Permission::Create, EntityKind::TokenAllocation),
                &sub_id,
                NewAllocation::undistributed(0.0, "AUR"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }

    #[tokio::test]
    async fn mark_distributed() {
        let svc = test_service().await;
        let sub_id = subscription(&svc).await;
        let allocation = svc
            .add_token_allocation(
                &cap(Permission::Create, EntityKind::TokenAllocation),
                &sub_id,
                NewAllocation::undistributed(100.0, "AUR"),
            )
            .await
            .unwrap();

        let updated = svc
            .update_token_allocation(
                &cap_on(
                    Permission::Update,
                    EntityRef::new(EntityKind::TokenAllocation, &allocation.id),
                ),
                &allocation.id,
                AllocationUpdateBuilder::new().distributed_with("0xabc123").build(),
            )
            .await
            .unwrap();
        assert!(updated.distributed);
        assert!(updated.distribution_date.is_some());
        assert_eq!(updated.distribution_tx_hash.as_deref(), Some("0xabc123"));
    }
}
