//! Redemption requests and their approver slots.

use tracing::info;

use cap_core::entities::{NewActivity, NewRedemption, RedemptionApprover, RedemptionRequest};
use cap_core::enums::{EntityKind, Permission, RedemptionStatus};
use cap_core::identity::{Capability, EntityRef};
use cap_core::ids::{PREFIX_APPROVER, PREFIX_REDEMPTION};

use crate::error::DatabaseError;
use crate::helpers::{
    format_timestamp, get_bool, get_opt_string, now_micros, parse_datetime, parse_enum,
    parse_optional_datetime,
};
use crate::service::{CapService, authorize, authorize_create, finish};

const SELECT_COLS: &str = "id, investor_id, token_amount, token_type, status, created_at";

const APPROVER_COLS: &str = "id, redemption_id, approver_id, approved, approved_at";

fn row_to_redemption(row: &libsql::Row) -> Result<RedemptionRequest, DatabaseError> {
    Ok(RedemptionRequest {
        id: row.get(0)?,
        investor_id: row.get(1)?,
        token_amount: row.get(2)?,
        token_type: row.get(3)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

fn row_to_approver(row: &libsql::Row) -> Result<RedemptionApprover, DatabaseError> {
    Ok(RedemptionApprover {
        id: row.get(0)?,
        redemption_id: row.get(1)?,
        approver_id: row.get(2)?,
        approved: get_bool(row, 3)?,
        approved_at: parse_optional_datetime(get_opt_string(row, 4)?.as_deref())?,
    })
}

impl CapService {
    /// Open a pending redemption request for an investor.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the investor does not exist, or
    /// `DatabaseError::InvalidState` for a non-positive amount.
    pub async fn create_redemption_request(
        &self,
        cap: &Capability,
        investor_id: &str,
        new: NewRedemption,
    ) -> Result<RedemptionRequest, DatabaseError> {
        authorize_create(cap, EntityKind::RedemptionRequest)?;
        if new.token_amount <= 0.0 {
            return Err(DatabaseError::InvalidState(format!(
                "redemption amount must be positive: {}",
                new.token_amount
            )));
        }
        self.get_investor(investor_id).await?;

        let now = now_micros();
        let request = RedemptionRequest {
            id: self.db().generate_id(PREFIX_REDEMPTION).await?,
            investor_id: investor_id.to_string(),
            token_amount: new.token_amount,
            token_type: new.token_type,
            status: RedemptionStatus::Pending,
            created_at: now,
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO redemption_requests ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                libsql::params![
                    request.id.as_str(),
                    request.investor_id.as_str(),
                    request.token_amount,
                    request.token_type.as_str(),
                    request.status.as_str(),
                    format_timestamp(now)
                ],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    entity_type: Some(EntityKind::RedemptionRequest.as_str().into()),
                    entity_id: Some(request.id.clone()),
                    details: Some(format!(
                        "{} {} for {}",
                        request.token_amount, request.token_type, request.investor_id
                    )),
                    ..NewActivity::new("create_redemption_requests")
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        info!(redemption = %request.id, investor = investor_id, "redemption requested");
        Ok(request)
    }

    pub async fn get_redemption_request(
        &self,
        id: &str,
    ) -> Result<RedemptionRequest, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM redemption_requests WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("redemption_request", id))?;
        row_to_redemption(&row)
    }

    /// An investor's redemption requests, newest first.
    pub async fn list_redemption_requests(
        &self,
        investor_id: &str,
    ) -> Result<Vec<RedemptionRequest>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM redemption_requests WHERE investor_id = ?1
                     ORDER BY created_at DESC, rowid DESC"
                ),
                [investor_id],
            )
            .await?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next().await? {
            requests.push(row_to_redemption(&row)?);
        }
        Ok(requests)
    }

    /// Attach an approver slot to a redemption request. The slot starts
    /// unapproved.
    ///
    /// Requires `update` on the request itself.
    pub async fn add_redemption_approver(
        &self,
        cap: &Capability,
        redemption_id: &str,
        approver_id: &str,
    ) -> Result<RedemptionApprover, DatabaseError> {
        authorize(
            cap,
            Permission::Update,
            &EntityRef::new(EntityKind::RedemptionRequest, redemption_id),
        )?;
        if approver_id.trim().is_empty() {
            return Err(DatabaseError::InvalidState(
                "approver id must not be empty".into(),
            ));
        }
        self.get_redemption_request(redemption_id).await?;

        let approver = RedemptionApprover {
            id: self.db().generate_id(PREFIX_APPROVER).await?,
            redemption_id: redemption_id.to_string(),
            approver_id: approver_id.to_string(),
            approved: false,
            approved_at: None,
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO redemption_approvers ({APPROVER_COLS}) VALUES (?1, ?2, ?3, 0, NULL)"),
                libsql::params![
                    approver.id.as_str(),
                    approver.redemption_id.as_str(),
                    approver.approver_id.as_str()
                ],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    entity_type: Some(EntityKind::RedemptionRequest.as_str().into()),
                    entity_id: Some(redemption_id.to_string()),
                    details: Some(format!("approver {approver_id}")),
                    ..NewActivity::new("create_redemption_approvers")
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;
        Ok(approver)
    }

    pub async fn list_redemption_approvers(
        &self,
        redemption_id: &str,
    ) -> Result<Vec<RedemptionApprover>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {APPROVER_COLS} FROM redemption_approvers WHERE redemption_id = ?1
                     ORDER BY rowid ASC"
                ),
                [redemption_id],
            )
            .await?;
        let mut approvers = Vec::new();
        while let Some(row) = rows.next().await? {
            approvers.push(row_to_approver(&row)?);
        }
        Ok(approvers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{cap, cap_on, test_service};
    use cap_core::entities::NewInvestor;
    use pretty_assertions::assert_eq;

    fn redemption(amount: f64) -> NewRedemption {
        NewRedemption {
            token_amount: amount,
            token_type: "AUR".into(),
        }
    }

    #[tokio::test]
    async fn request_starts_pending_with_approvers() {
        let svc = test_service().await;
        let investor = svc
            .create_investor(
                &cap(Permission::Create, EntityKind::Investor),
                NewInvestor::individual("Ada", "ada@example.com"),
            )
            .await
            .unwrap();
        let request = svc
            .create_redemption_request(
                &cap(Permission::Create, EntityKind::RedemptionRequest),
                &investor.id,
                redemption(40.0),
            )
            .await
            .unwrap();
        assert_eq!(request.status, RedemptionStatus::Pending);
        assert!(request.id.starts_with("red-"));

        let update = cap_on(
            Permission::Update,
            EntityRef::new(EntityKind::RedemptionRequest, &request.id),
        );
        for approver in ["usr-cfo", "usr-legal"] {
            svc.add_redemption_approver(&update, &request.id, approver)
                .await
                .unwrap();
        }

        let approvers = svc.list_redemption_approvers(&request.id).await.unwrap();
        let ids: Vec<_> = approvers.iter().map(|a| a.approver_id.as_str()).collect();
        assert_eq!(ids, vec!["usr-cfo", "usr-legal"]);
        assert!(approvers.iter().all(|a| !a.approved && a.approved_at.is_none()));

        let listed = svc.list_redemption_requests(&investor.id).await.unwrap();
        assert_eq!(listed, vec![request]);
    }

    #[tokio::test]
    async fn unknown_investor_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .create_redemption_request(
                &cap(Permission::Create, EntityKind::RedemptionRequest),
                "inv-missing",
                redemption(1.0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn approver_needs_capability_on_that_request() {
        let svc = test_service().await;
        let other = cap_on(
            Permission::Update,
            EntityRef::new(EntityKind::RedemptionRequest, "red-other"),
        );
        let err = svc
            .add_redemption_approver(&other, "red-target", "usr-cfo")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Forbidden(_)));
    }
}
