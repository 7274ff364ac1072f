//! Investor repository: CRUD, KYC updates, expiry queries, cascade delete.

use chrono::{Duration, Utc};
use tracing::info;

use cap_core::entities::{Investor, NewActivity, NewInvestor};
use cap_core::enums::{EntityKind, KycStatus, Permission};
use cap_core::identity::{Capability, EntityRef};
use cap_core::ids::PREFIX_INVESTOR;

use crate::cascade::CascadeReport;
use crate::error::DatabaseError;
use crate::helpers::{
    SetClause, format_timestamp, get_opt_string, now_micros, opt_value, parse_datetime,
    parse_enum, parse_optional_datetime, parse_optional_json,
};
use crate::service::{CapService, authorize, authorize_create, finish};
use crate::updates::investor::{InvestorUpdate, KycUpdate};

pub(crate) const SELECT_COLS: &str = "id, name, email, investor_type, company, kyc_status, kyc_expiry_date, verification_details, wallet_address, created_at, updated_at";

pub(crate) fn row_to_investor(row: &libsql::Row) -> Result<Investor, DatabaseError> {
    Ok(Investor {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        investor_type: row.get(3)?,
        company: get_opt_string(row, 4)?,
        kyc_status: parse_enum(&row.get::<String>(5)?)?,
        kyc_expiry_date: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        verification_details: parse_optional_json(get_opt_string(row, 7)?.as_deref())?,
        wallet_address: get_opt_string(row, 8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        updated_at: parse_datetime(&row.get::<String>(10)?)?,
    })
}

fn investor_activity(action: &str, id: &str) -> NewActivity {
    NewActivity {
        entity_type: Some(EntityKind::Investor.as_str().into()),
        entity_id: Some(id.to_string()),
        ..NewActivity::new(action)
    }
}

impl CapService {
    pub async fn create_investor(
        &self,
        cap: &Capability,
        new: NewInvestor,
    ) -> Result<Investor, DatabaseError> {
        authorize_create(cap, EntityKind::Investor)?;
        if !new.email.contains('@') {
            return Err(DatabaseError::InvalidState(format!(
                "'{}' is not an email address",
                new.email
            )));
        }

        let now = now_micros();
        let investor = Investor {
            id: self.db().generate_id(PREFIX_INVESTOR).await?,
            name: new.name,
            email: new.email,
            investor_type: new.investor_type,
            company: new.company,
            kyc_status: KycStatus::NotStarted,
            kyc_expiry_date: None,
            verification_details: None,
            wallet_address: new.wallet_address,
            created_at: now,
            updated_at: now,
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!("INSERT INTO investors ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
                libsql::params![
                    investor.id.as_str(),
                    investor.name.as_str(),
                    investor.email.as_str(),
                    investor.investor_type.as_str(),
                    investor.company.as_deref(),
                    investor.kyc_status.as_str(),
                    libsql::Value::Null,
                    libsql::Value::Null,
                    investor.wallet_address.as_deref(),
                    format_timestamp(now),
                    format_timestamp(now)
                ],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                investor_activity("create_investors", &investor.id),
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        info!(investor = %investor.id, "investor created");
        Ok(investor)
    }

    pub async fn get_investor(&self, id: &str) -> Result<Investor, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM investors WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("investor", id))?;
        row_to_investor(&row)
    }

    /// Ordered by name.
    pub async fn list_investors(&self, limit: u32) -> Result<Vec<Investor>, DatabaseError> {
        self.query_investors(
            &format!("SELECT {SELECT_COLS} FROM investors ORDER BY name ASC, id ASC LIMIT ?1"),
            libsql::params![i64::from(limit)],
        )
        .await
    }

    pub async fn list_investors_by_kyc_status(
        &self,
        status: KycStatus,
        limit: u32,
    ) -> Result<Vec<Investor>, DatabaseError> {
        self.query_investors(
            &format!(
                "SELECT {SELECT_COLS} FROM investors WHERE kyc_status = ?1 ORDER BY name ASC, id ASC LIMIT ?2"
            ),
            libsql::params![status.as_str(), i64::from(limit)],
        )
        .await
    }

    /// Approved investors whose KYC expires within `days` from now
    /// (already-lapsed ones included), soonest first.
    pub async fn list_investors_with_expiring_kyc(
        &self,
        days: u32,
    ) -> Result<Vec<Investor>, DatabaseError> {
        let horizon = Utc::now() + Duration::days(i64::from(days));
        self.query_investors(
            &format!(
                "SELECT {SELECT_COLS} FROM investors
                 WHERE kyc_status = ?1 AND kyc_expiry_date IS NOT NULL AND kyc_expiry_date <= ?2
                 ORDER BY kyc_expiry_date ASC"
            ),
            libsql::params![KycStatus::Approved.as_str(), format_timestamp(horizon)],
        )
        .await
    }

    pub async fn update_investor(
        &self,
        cap: &Capability,
        id: &str,
        update: InvestorUpdate,
    ) -> Result<Investor, DatabaseError> {
        authorize(cap, Permission::Update, &EntityRef::investor(id))?;
        let current = self.get_investor(id).await?;

        let mut clause = SetClause::new();
        if let Some(ref name) = update.name {
            clause.set("name", name.clone());
        }
        if let Some(ref email) = update.email {
            if !email.contains('@') {
                return Err(DatabaseError::InvalidState(format!(
                    "'{email}' is not an email address"
                )));
            }
            clause.set("email", email.clone());
        }
        if let Some(ref investor_type) = update.investor_type {
            clause.set("investor_type", investor_type.clone());
        }
        if let Some(ref company) = update.company {
            clause.set("company", opt_value(company.clone()));
        }
        if let Some(ref wallet_address) = update.wallet_address {
            clause.set("wallet_address", opt_value(wallet_address.clone()));
        }

        if clause.is_empty() {
            return Ok(current);
        }
        clause.set("updated_at", format_timestamp(Utc::now()));
        let details =
            serde_json::to_string(&update).map_err(|e| DatabaseError::Other(e.into()))?;
        self.apply_investor_update(cap, id, clause, "update_investors", details)
            .await?;
        self.get_investor(id).await
    }

    /// Record a KYC outcome. Requires a `manage_kyc` capability.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Forbidden` without `manage_kyc` on this investor
    /// - `DatabaseError::NotFound` for an unknown id
    pub async fn update_investor_kyc(
        &self,
        cap: &Capability,
        id: &str,
        update: KycUpdate,
    ) -> Result<Investor, DatabaseError> {
        authorize(cap, Permission::ManageKyc, &EntityRef::investor(id))?;
        let current = self.get_investor(id).await?;

        let mut clause = SetClause::new();
        clause.set("kyc_status", update.status.as_str());
        if let Some(expiry) = update.expiry_date {
            clause.set("kyc_expiry_date", format_timestamp(expiry));
        }
        if let Some(ref details) = update.verification_details {
            clause.set("verification_details", details.to_string());
        }
        clause.set("updated_at", format_timestamp(Utc::now()));

        let details = format!("{} -> {}", current.kyc_status, update.status);
        self.apply_investor_update(cap, id, clause, "update_kyc_investors", details)
            .await?;
        info!(investor = id, status = %update.status, "KYC status recorded");
        self.get_investor(id).await
    }

    /// Delete an investor with its subscriptions, allocations, redemption
    /// requests, cap-table links and group memberships.
    pub async fn delete_investor(
        &self,
        cap: &Capability,
        id: &str,
    ) -> Result<CascadeReport, DatabaseError> {
        self.delete_entity(cap, &EntityRef::investor(id)).await
    }

    async fn apply_investor_update(
        &self,
        cap: &Capability,
        id: &str,
        clause: SetClause,
        action: &str,
        details: String,
    ) -> Result<(), DatabaseError> {
        let (sql, params) = clause.into_update("investors", id);
        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(&sql, libsql::params_from_iter(params)).await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    details: Some(details),
                    ..investor_activity(action, id)
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await
    }

    async fn query_investors(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Investor>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut investors = Vec::new();
        while let Some(row) = rows.next().await? {
            investors.push(row_to_investor(&row)?);
        }
        Ok(investors)
    }
}
