//! Investor groups and membership.

use cap_core::entities::{Investor, InvestorGroup, InvestorGroupMember, NewActivity};
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::{Capability, EntityRef};
use cap_core::ids::{PREFIX_GROUP_MEMBER, PREFIX_INVESTOR_GROUP};

use crate::error::DatabaseError;
use crate::helpers::{format_timestamp, now_micros, parse_datetime, qualify};
use crate::repos::investor::{self, row_to_investor};
use crate::service::{CapService, authorize, authorize_create, finish};

fn row_to_group(row: &libsql::Row) -> Result<InvestorGroup, DatabaseError> {
    Ok(InvestorGroup {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: parse_datetime(&row.get::<String>(2)?)?,
    })
}

impl CapService {
    pub async fn create_investor_group(
        &self,
        cap: &Capability,
        name: &str,
    ) -> Result<InvestorGroup, DatabaseError> {
        authorize_create(cap, EntityKind::InvestorGroup)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DatabaseError::InvalidState(
                "group name must not be empty".into(),
            ));
        }

        let now = now_micros();
        let group = InvestorGroup {
            id: self.db().generate_id(PREFIX_INVESTOR_GROUP).await?,
            name: name.to_string(),
            created_at: now,
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                "INSERT INTO investor_groups (id, name, created_at) VALUES (?1, ?2, ?3)",
                libsql::params![group.id.as_str(), group.name.as_str(), format_timestamp(now)],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    entity_type: Some(EntityKind::InvestorGroup.as_str().into()),
                    entity_id: Some(group.id.clone()),
                    details: Some(group.name.clone()),
                    ..NewActivity::new("create_investor_groups")
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;
        Ok(group)
    }

    pub async fn get_investor_group(&self, id: &str) -> Result<InvestorGroup, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, created_at FROM investor_groups WHERE id = ?1",
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("investor_group", id))?;
        row_to_group(&row)
    }

    /// Add an investor to a group. Adding an existing member returns the
    /// existing membership row.
    ///
    /// Requires `update` on the group.
    pub async fn add_investor_to_group(
        &self,
        cap: &Capability,
        group_id: &str,
        investor_id: &str,
    ) -> Result<InvestorGroupMember, DatabaseError> {
        authorize(
            cap,
            Permission::Update,
            &EntityRef::new(EntityKind::InvestorGroup, group_id),
        )?;
        self.get_investor_group(group_id).await?;
        self.get_investor(investor_id).await?;

        let member_id = self.db().generate_id(PREFIX_GROUP_MEMBER).await?;

        let tx = self.begin().await?;
        let result: Result<InvestorGroupMember, DatabaseError> = async {
            let inserted = tx
                .execute(
                    "INSERT OR IGNORE INTO investor_groups_investors (id, group_id, investor_id)
                     VALUES (?1, ?2, ?3)",
                    libsql::params![member_id.as_str(), group_id, investor_id],
                )
                .await?;
            let mut rows = tx
                .query(
                    "SELECT id FROM investor_groups_investors WHERE group_id = ?1 AND investor_id = ?2",
                    libsql::params![group_id, investor_id],
                )
                .await?;
            let id: String = rows.next().await?.ok_or(DatabaseError::NoResult)?.get(0)?;
            if inserted > 0 {
                self.insert_activity(
                    &tx,
                    Some(cap.actor()),
                    NewActivity {
                        entity_type: Some(EntityKind::InvestorGroup.as_str().into()),
                        entity_id: Some(group_id.to_string()),
                        details: Some(format!("added {investor_id}")),
                        ..NewActivity::new("create_investor_groups_investors")
                    },
                )
                .await?;
            }
            Ok(InvestorGroupMember {
                id,
                group_id: group_id.to_string(),
                investor_id: investor_id.to_string(),
            })
        }
        .await;
        finish(tx, result).await
    }

    /// Members of a group, by name.
    pub async fn list_group_members(&self, group_id: &str) -> Result<Vec<Investor>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM investors i
             JOIN investor_groups_investors g ON g.investor_id = i.id
             WHERE g.group_id = ?1 ORDER BY i.name ASC, i.id ASC",
            qualify(investor::SELECT_COLS, "i")
        );
        let mut rows = self.db().conn().query(&sql, [group_id]).await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(row_to_investor(&row)?);
        }
        Ok(members)
    }
}
