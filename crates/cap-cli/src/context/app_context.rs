use std::path::Path;

use anyhow::Context;
use cap_config::{CapConfig, ConfigError};
use cap_core::enums::{EntityKind, Permission};
use cap_core::identity::{Actor, Capability, EntityRef, Scope};
use cap_db::service::CapService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: CapService,
    pub config: CapConfig,
    pub actor: Option<Actor>,
}

impl AppContext {
    /// Open the configured database and resolve the acting user.
    pub async fn init(config: CapConfig) -> anyhow::Result<Self> {
        let actor = match config.identity.actor() {
            Ok(actor) => Some(actor),
            Err(ConfigError::NotConfigured { .. }) => {
                tracing::debug!("identity not configured; running read-only");
                None
            }
            Err(error) => return Err(error).context("invalid identity configuration"),
        };

        let service = if config.database.is_remote() {
            CapService::new_remote(&config.database.url, &config.database.auth_token)
                .await
                .context("failed to open remote captable database")?
        } else {
            let path = &config.database.path;
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.with_context(|| {
                        format!("failed to create database directory {}", parent.display())
                    })?;
                }
            }
            CapService::new_local(path)
                .await
                .with_context(|| format!("failed to open captable database at {path}"))?
        };

        Ok(Self {
            service,
            config,
            actor,
        })
    }

    /// Mint a capability for the configured actor under the configured
    /// role policy.
    pub fn grant(&self, permission: Permission, scope: Scope) -> anyhow::Result<Capability> {
        let actor = self.actor.as_ref().context(
            "identity not configured; set identity.user_id and identity.email \
             (or CAPTABLE_IDENTITY__USER_ID / CAPTABLE_IDENTITY__EMAIL)",
        )?;
        Ok(actor.grant_under(&self.config.policy, permission, scope)?)
    }

    /// Capability over every row of `kind`, as creates require.
    pub fn grant_kind(&self, permission: Permission, kind: EntityKind) -> anyhow::Result<Capability> {
        self.grant(permission, Scope::Kind(kind))
    }

    /// Capability over exactly one row.
    pub fn grant_on(&self, permission: Permission, target: EntityRef) -> anyhow::Result<Capability> {
        self.grant(permission, Scope::Entity(target))
    }
}
