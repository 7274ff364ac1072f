//! # cap-config
//!
//! Layered configuration for captable using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CAPTABLE_*` prefix, `__` as separator)
//! 2. Project-level `.captable/config.toml`
//! 3. User-level `~/.config/captable/config.toml`
//! 4. Built-in defaults
//!
//! `CAPTABLE_DATABASE__PATH` maps to `database.path`,
//! `CAPTABLE_IDENTITY__ROLE` to `identity.role`, and so on. The `[policy]`
//! table maps each role to the permissions it may mint, e.g.
//! `CAPTABLE_POLICY__MANAGER='["create","update","delete"]'`.
//!
//! ```no_run
//! use cap_config::CapConfig;
//!
//! let config = CapConfig::load_with_dotenv().expect("config");
//! if config.database.is_remote() {
//!     println!("remote: {}", config.database.url);
//! }
//! ```

mod activity;
mod database;
mod error;
mod general;
mod identity;

pub use activity::ActivityConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use identity::IdentityConfig;

pub use cap_core::identity::RolePolicy;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CAPTABLE_";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CapConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub policy: RolePolicy,
}

impl CapConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does not read `.env`; see [`Self::load_with_dotenv`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source fails to parse or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` from the workspace root, then [`Self::load`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain. Public so tests can layer extra
    /// providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".captable/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject values that deserialize but cannot be used.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.activity.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "activity.page_size".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.database.path.is_empty() && !self.database.is_remote() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "empty path and no remote database configured".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("captable").join("config.toml"))
    }

    /// Walks up from `CARGO_MANIFEST_DIR` looking for `.env`, falling back to
    /// the current directory. Missing files are ignored.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }
        let _ = dotenvy::dotenv();
    }
}
