//! Multi-signature wallets: activation state, signatories and the address
//! whitelist.
//!
//! Signatories and whitelist entries belong to one wallet; changing them
//! requires `update` on that wallet. Deleting a wallet cascades to both.

use tracing::info;

use cap_core::entities::{
    MultiSigWallet, NewActivity, NewSignatory, NewWallet, WalletSignatory, WhitelistEntry,
};
use cap_core::enums::{EntityKind, Permission, SignatoryStatus, WalletStatus};
use cap_core::identity::{Capability, EntityRef};
use cap_core::ids::{PREFIX_SIGNATORY, PREFIX_WALLET, PREFIX_WHITELIST};

use crate::cascade::CascadeReport;
use crate::error::DatabaseError;
use crate::helpers::{
    SetClause, format_timestamp, get_opt_string, now_micros, opt_value, parse_datetime,
    parse_enum, parse_optional_datetime,
};
use crate::service::{CapService, authorize, authorize_create, finish};

const SELECT_COLS: &str = "id, address, name, required_signatures, status, activated_at, \
    blocked_at, block_reason, created_at, updated_at";

const SIGNATORY_COLS: &str = "id, wallet_id, name, email, role, status, created_at";

const WHITELIST_COLS: &str = "id, wallet_id, address, label, added_by, added_at";

fn row_to_wallet(row: &libsql::Row) -> Result<MultiSigWallet, DatabaseError> {
    let required: i64 = row.get(3)?;
    Ok(MultiSigWallet {
        id: row.get(0)?,
        address: row.get(1)?,
        name: row.get(2)?,
        required_signatures: u32::try_from(required).map_err(|e| {
            DatabaseError::Mapping(format!("required_signatures {required}: {e}"))
        })?,
        status: parse_enum(&row.get::<String>(4)?)?,
        activated_at: parse_optional_datetime(get_opt_string(row, 5)?.as_deref())?,
        blocked_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
        block_reason: get_opt_string(row, 7)?,
        created_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_at: parse_datetime(&row.get::<String>(9)?)?,
    })
}

fn row_to_signatory(row: &libsql::Row) -> Result<WalletSignatory, DatabaseError> {
    Ok(WalletSignatory {
        id: row.get(0)?,
        wallet_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        role: row.get(4)?,
        status: parse_enum(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

fn row_to_whitelist_entry(row: &libsql::Row) -> Result<WhitelistEntry, DatabaseError> {
    Ok(WhitelistEntry {
        id: row.get(0)?,
        wallet_id: row.get(1)?,
        address: row.get(2)?,
        label: get_opt_string(row, 3)?,
        added_by: get_opt_string(row, 4)?,
        added_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

fn wallet_ref(id: &str) -> EntityRef {
    EntityRef::new(EntityKind::MultiSigWallet, id)
}

fn wallet_activity(action: &str, wallet_id: &str) -> NewActivity {
    NewActivity {
        entity_type: Some(EntityKind::MultiSigWallet.as_str().into()),
        entity_id: Some(wallet_id.to_string()),
        ..NewActivity::new(action)
    }
}

impl CapService {
    /// Register a wallet. It starts `pending`.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::Forbidden` without a kind-wide `create` capability
    /// - `DatabaseError::InvalidState` for a blank address, zero required
    ///   signatures, or an address that is already registered
    pub async fn create_wallet(
        &self,
        cap: &Capability,
        new: NewWallet,
    ) -> Result<MultiSigWallet, DatabaseError> {
        authorize_create(cap, EntityKind::MultiSigWallet)?;
        let address = new.address.trim();
        if address.is_empty() {
            return Err(DatabaseError::InvalidState(
                "wallet address must not be empty".into(),
            ));
        }
        if new.required_signatures == 0 {
            return Err(DatabaseError::InvalidState(
                "a wallet needs at least one required signature".into(),
            ));
        }
        if self.find_wallet_by_address(address).await?.is_some() {
            return Err(DatabaseError::InvalidState(format!(
                "wallet {address} is already registered"
            )));
        }

        let now = now_micros();
        let wallet = MultiSigWallet {
            id: self.db().generate_id(PREFIX_WALLET).await?,
            address: address.to_string(),
            name: new.name,
            required_signatures: new.required_signatures,
            status: WalletStatus::Pending,
            activated_at: None,
            blocked_at: None,
            block_reason: None,
            created_at: now,
            updated_at: now,
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!(
                    "INSERT INTO multi_sig_wallets ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, NULL, NULL, NULL, ?6, ?6)"
                ),
                libsql::params![
                    wallet.id.as_str(),
                    wallet.address.as_str(),
                    wallet.name.as_str(),
                    i64::from(wallet.required_signatures),
                    wallet.status.as_str(),
                    format_timestamp(now)
                ],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    details: Some(wallet.address.clone()),
                    ..wallet_activity("create_multi_sig_wallets", &wallet.id)
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;

        info!(wallet = %wallet.id, address = %wallet.address, "wallet registered");
        Ok(wallet)
    }

    pub async fn get_wallet(&self, id: &str) -> Result<MultiSigWallet, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM multi_sig_wallets WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("multi_sig_wallet", id))?;
        row_to_wallet(&row)
    }

    /// Look a wallet up by its on-chain address.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no wallet has that address.
    pub async fn get_wallet_status(&self, address: &str) -> Result<MultiSigWallet, DatabaseError> {
        self.find_wallet_by_address(address)
            .await?
            .ok_or_else(|| DatabaseError::not_found("multi_sig_wallet", address))
    }

    /// All wallets, by name.
    pub async fn list_wallets(&self) -> Result<Vec<MultiSigWallet>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM multi_sig_wallets ORDER BY name ASC, id ASC"),
                (),
            )
            .await?;
        let mut wallets = Vec::new();
        while let Some(row) = rows.next().await? {
            wallets.push(row_to_wallet(&row)?);
        }
        Ok(wallets)
    }

    /// Mark a wallet active. Activating a blocked wallet clears the block.
    pub async fn activate_wallet(
        &self,
        cap: &Capability,
        id: &str,
    ) -> Result<MultiSigWallet, DatabaseError> {
        authorize(cap, Permission::Update, &wallet_ref(id))?;
        let current = self.get_wallet(id).await?;
        if current.status == WalletStatus::Active {
            return Ok(current);
        }

        let now = format_timestamp(now_micros());
        let mut clause = SetClause::new();
        clause.set("status", WalletStatus::Active.as_str());
        clause.set("activated_at", now.clone());
        clause.set("blocked_at", libsql::Value::Null);
        clause.set("block_reason", libsql::Value::Null);
        clause.set("updated_at", now);
        self.apply_wallet_update(cap, id, clause, format!("{} -> active", current.status))
            .await?;
        info!(wallet = id, "wallet activated");
        self.get_wallet(id).await
    }

    /// Block a wallet, recording why.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidState` for a blank reason.
    pub async fn block_wallet(
        &self,
        cap: &Capability,
        id: &str,
        reason: &str,
    ) -> Result<MultiSigWallet, DatabaseError> {
        authorize(cap, Permission::Update, &wallet_ref(id))?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DatabaseError::InvalidState(
                "a block reason is required".into(),
            ));
        }
        let current = self.get_wallet(id).await?;

        let now = format_timestamp(now_micros());
        let mut clause = SetClause::new();
        clause.set("status", WalletStatus::Blocked.as_str());
        clause.set("blocked_at", now.clone());
        clause.set("block_reason", reason);
        clause.set("updated_at", now);
        self.apply_wallet_update(
            cap,
            id,
            clause,
            format!("{} -> blocked: {reason}", current.status),
        )
        .await?;
        info!(wallet = id, reason, "wallet blocked");
        self.get_wallet(id).await
    }

    /// Add a pending signatory. An email may appear once per wallet.
    pub async fn add_signatory(
        &self,
        cap: &Capability,
        wallet_id: &str,
        new: NewSignatory,
    ) -> Result<WalletSignatory, DatabaseError> {
        authorize(cap, Permission::Update, &wallet_ref(wallet_id))?;
        if !new.email.contains('@') {
            return Err(DatabaseError::InvalidState(format!(
                "'{}' is not an email address",
                new.email
            )));
        }
        self.get_wallet(wallet_id).await?;
        if self
            .list_signatories(wallet_id)
            .await?
            .iter()
            .any(|s| s.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(DatabaseError::InvalidState(format!(
                "{} is already a signatory of {wallet_id}",
                new.email
            )));
        }

        let signatory = WalletSignatory {
            id: self.db().generate_id(PREFIX_SIGNATORY).await?,
            wallet_id: wallet_id.to_string(),
            name: new.name,
            email: new.email,
            role: new.role,
            status: SignatoryStatus::Pending,
            created_at: now_micros(),
        };

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(
                &format!(
                    "INSERT INTO wallet_signatories ({SIGNATORY_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                libsql::params![
                    signatory.id.as_str(),
                    signatory.wallet_id.as_str(),
                    signatory.name.as_str(),
                    signatory.email.as_str(),
                    signatory.role.as_str(),
                    signatory.status.as_str(),
                    format_timestamp(signatory.created_at)
                ],
            )
            .await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    details: Some(format!("{} ({})", signatory.email, signatory.role)),
                    ..wallet_activity("create_wallet_signatories", wallet_id)
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await?;
        Ok(signatory)
    }

    /// Remove a signatory from a wallet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the signatory is not on this
    /// wallet.
    pub async fn remove_signatory(
        &self,
        cap: &Capability,
        wallet_id: &str,
        signatory_id: &str,
    ) -> Result<(), DatabaseError> {
        authorize(cap, Permission::Update, &wallet_ref(wallet_id))?;

        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            let removed = tx
                .execute(
                    "DELETE FROM wallet_signatories WHERE id = ?1 AND wallet_id = ?2",
                    libsql::params![signatory_id, wallet_id],
                )
                .await?;
            if removed == 0 {
                return Err(DatabaseError::not_found("wallet_signatory", signatory_id));
            }
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    details: Some(signatory_id.to_string()),
                    ..wallet_activity("delete_wallet_signatories", wallet_id)
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await
    }

    /// A wallet's signatories in the order they were added.
    pub async fn list_signatories(
        &self,
        wallet_id: &str,
    ) -> Result<Vec<WalletSignatory>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SIGNATORY_COLS} FROM wallet_signatories WHERE wallet_id = ?1
                     ORDER BY created_at ASC, rowid ASC"
                ),
                [wallet_id],
            )
            .await?;
        let mut signatories = Vec::new();
        while let Some(row) = rows.next().await? {
            signatories.push(row_to_signatory(&row)?);
        }
        Ok(signatories)
    }

    /// Whitelist a destination address. Adding an address that is already
    /// listed returns the existing entry.
    pub async fn add_to_whitelist(
        &self,
        cap: &Capability,
        wallet_id: &str,
        address: &str,
        label: Option<&str>,
    ) -> Result<WhitelistEntry, DatabaseError> {
        authorize(cap, Permission::Update, &wallet_ref(wallet_id))?;
        let address = address.trim();
        if address.is_empty() {
            return Err(DatabaseError::InvalidState(
                "whitelist address must not be empty".into(),
            ));
        }
        self.get_wallet(wallet_id).await?;

        let entry_id = self.db().generate_id(PREFIX_WHITELIST).await?;
        let added_at = format_timestamp(now_micros());

        let tx = self.begin().await?;
        let result: Result<WhitelistEntry, DatabaseError> = async {
            let inserted = tx
                .execute(
                    &format!(
                        "INSERT OR IGNORE INTO wallet_whitelist ({WHITELIST_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                    ),
                    libsql::params![
                        entry_id.as_str(),
                        wallet_id,
                        address,
                        opt_value(label),
                        cap.actor().email.as_str(),
                        added_at.as_str()
                    ],
                )
                .await?;
            let mut rows = tx
                .query(
                    &format!(
                        "SELECT {WHITELIST_COLS} FROM wallet_whitelist
                         WHERE wallet_id = ?1 AND address = ?2"
                    ),
                    libsql::params![wallet_id, address],
                )
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            let entry = row_to_whitelist_entry(&row)?;
            if inserted > 0 {
                self.insert_activity(
                    &tx,
                    Some(cap.actor()),
                    NewActivity {
                        details: Some(address.to_string()),
                        ..wallet_activity("create_wallet_whitelist", wallet_id)
                    },
                )
                .await?;
            }
            Ok(entry)
        }
        .await;
        finish(tx, result).await
    }

    /// Remove an address from the whitelist. Returns whether it was listed.
    pub async fn remove_from_whitelist(
        &self,
        cap: &Capability,
        wallet_id: &str,
        address: &str,
    ) -> Result<bool, DatabaseError> {
        authorize(cap, Permission::Update, &wallet_ref(wallet_id))?;

        let tx = self.begin().await?;
        let result: Result<bool, DatabaseError> = async {
            let removed = tx
                .execute(
                    "DELETE FROM wallet_whitelist WHERE wallet_id = ?1 AND address = ?2",
                    libsql::params![wallet_id, address.trim()],
                )
                .await?;
            if removed > 0 {
                self.insert_activity(
                    &tx,
                    Some(cap.actor()),
                    NewActivity {
                        details: Some(address.trim().to_string()),
                        ..wallet_activity("delete_wallet_whitelist", wallet_id)
                    },
                )
                .await?;
            }
            Ok(removed > 0)
        }
        .await;
        finish(tx, result).await
    }

    pub async fn list_whitelist(
        &self,
        wallet_id: &str,
    ) -> Result<Vec<WhitelistEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {WHITELIST_COLS} FROM wallet_whitelist WHERE wallet_id = ?1
                     ORDER BY added_at ASC, rowid ASC"
                ),
                [wallet_id],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_whitelist_entry(&row)?);
        }
        Ok(entries)
    }

    /// Delete a wallet with its signatories and whitelist.
    pub async fn delete_wallet(
        &self,
        cap: &Capability,
        id: &str,
    ) -> Result<CascadeReport, DatabaseError> {
        self.delete_entity(cap, &wallet_ref(id)).await
    }

    async fn find_wallet_by_address(
        &self,
        address: &str,
    ) -> Result<Option<MultiSigWallet>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM multi_sig_wallets WHERE address = ?1"),
                [address.trim()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_wallet(&row)?)),
            None => Ok(None),
        }
    }

    async fn apply_wallet_update(
        &self,
        cap: &Capability,
        id: &str,
        clause: SetClause,
        details: String,
    ) -> Result<(), DatabaseError> {
        let (sql, params) = clause.into_update("multi_sig_wallets", id);
        let tx = self.begin().await?;
        let result: Result<(), DatabaseError> = async {
            tx.execute(&sql, libsql::params_from_iter(params)).await?;
            self.insert_activity(
                &tx,
                Some(cap.actor()),
                NewActivity {
                    details: Some(details),
                    ..wallet_activity("update_multi_sig_wallets", id)
                },
            )
            .await?;
            Ok(())
        }
        .await;
        finish(tx, result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{cap, cap_on, test_service};
    use pretty_assertions::assert_eq;

    const ADDRESS: &str = "0x1234567890123456789012345678901234567890";

    async fn wallet(svc: &CapService) -> MultiSigWallet {
        svc.create_wallet(
            &cap(Permission::Create, EntityKind::MultiSigWallet),
            NewWallet {
                required_signatures: 2,
                ..NewWallet::new(ADDRESS, "Treasury")
            },
        )
        .await
        .unwrap()
    }

    fn signatory(name: &str, email: &str) -> NewSignatory {
        NewSignatory {
            name: name.into(),
            email: email.into(),
            role: "owner".into(),
        }
    }

    #[tokio::test]
    async fn wallet_starts_pending_and_is_found_by_address() {
        let svc = test_service().await;
        let created = wallet(&svc).await;
        assert_eq!(created.status, WalletStatus::Pending);
        assert!(created.id.starts_with("wal-"));

        let by_address = svc.get_wallet_status(ADDRESS).await.unwrap();
        assert_eq!(by_address, created);

        let err = svc.get_wallet_status("0xdead").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_address_and_zero_signatures_are_rejected() {
        let svc = test_service().await;
        wallet(&svc).await;
        let create = cap(Permission::Create, EntityKind::MultiSigWallet);

        let duplicate = svc
            .create_wallet(&create, NewWallet::new(ADDRESS, "Copy"))
            .await
            .unwrap_err();
        assert!(matches!(duplicate, DatabaseError::InvalidState(_)));

        let zero = svc
            .create_wallet(
                &create,
                NewWallet {
                    required_signatures: 0,
                    ..NewWallet::new("0xabc", "Zero")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(zero, DatabaseError::InvalidState(_)));
        assert_eq!(svc.list_wallets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn block_then_activate_clears_the_block() {
        let svc = test_service().await;
        let w = wallet(&svc).await;
        let update = cap_on(Permission::Update, wallet_ref(&w.id));

        let activated = svc.activate_wallet(&update, &w.id).await.unwrap();
        assert_eq!(activated.status, WalletStatus::Active);
        assert!(activated.activated_at.is_some());

        let blocked = svc
            .block_wallet(&update, &w.id, "compromised signer")
            .await
            .unwrap();
        assert_eq!(blocked.status, WalletStatus::Blocked);
        assert_eq!(blocked.block_reason.as_deref(), Some("compromised signer"));
        assert!(blocked.blocked_at.is_some());

        assert!(matches!(
            svc.block_wallet(&update, &w.id, "  ").await.unwrap_err(),
            DatabaseError::InvalidState(_)
        ));

        let reactivated = svc.activate_wallet(&update, &w.id).await.unwrap();
        assert_eq!(reactivated.status, WalletStatus::Active);
        assert!(reactivated.blocked_at.is_none());
        assert!(reactivated.block_reason.is_none());

        let history = svc
            .entity_activity(EntityKind::MultiSigWallet.as_str(), &w.id, 10)
            .await
            .unwrap();
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn signatories_are_added_once_and_removed() {
        let svc = test_service().await;
        let w = wallet(&svc).await;
        let update = cap_on(Permission::Update, wallet_ref(&w.id));

        let alice = svc
            .add_signatory(&update, &w.id, signatory("Alice", "alice@example.com"))
            .await
            .unwrap();
        svc.add_signatory(&update, &w.id, signatory("Bob", "bob@example.com"))
            .await
            .unwrap();
        assert_eq!(alice.status, SignatoryStatus::Pending);

        let again = svc
            .add_signatory(&update, &w.id, signatory("Alice", "ALICE@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(again, DatabaseError::InvalidState(_)));

        svc.remove_signatory(&update, &w.id, &alice.id).await.unwrap();
        let names: Vec<_> = svc
            .list_signatories(&w.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Bob"]);

        let missing = svc
            .remove_signatory(&update, &w.id, &alice.id)
            .await
            .unwrap_err();
        assert!(matches!(missing, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn whitelist_is_idempotent() {
        let svc = test_service().await;
        let w = wallet(&svc).await;
        let update = cap_on(Permission::Update, wallet_ref(&w.id));
        let exchange = "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd";

        let first = svc
            .add_to_whitelist(&update, &w.id, exchange, Some("Exchange Account"))
            .await
            .unwrap();
        let second = svc
            .add_to_whitelist(&update, &w.id, exchange, None)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.added_by.as_deref(), Some("admin@example.com"));

        assert!(svc.remove_from_whitelist(&update, &w.id, exchange).await.unwrap());
        assert!(!svc.remove_from_whitelist(&update, &w.id, exchange).await.unwrap());
        assert!(svc.list_whitelist(&w.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn changes_need_capability_on_that_wallet() {
        let svc = test_service().await;
        let w = wallet(&svc).await;
        let other = cap_on(Permission::Update, wallet_ref("wal-other"));

        let err = svc.activate_wallet(&other, &w.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Forbidden(_)));
        let err = svc
            .add_to_whitelist(&other, &w.id, "0xabc", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Forbidden(_)));
    }
}
