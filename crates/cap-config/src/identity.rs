//! Acting-user configuration. Resolved into a `cap_core::identity::Actor`
//! at startup.

use cap_core::enums::Role;
use cap_core::identity::Actor;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub email: String,

    /// Unset means `viewer`.
    #[serde(default)]
    pub role: Role,
}

impl IdentityConfig {
    pub fn is_configured(&self) -> bool {
        !self.user_id.is_empty() && !self.email.is_empty()
    }

    /// Build the actor for this identity.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if `user_id` or `email` is empty,
    /// or `ConfigError::InvalidValue` if the email has no `@`.
    pub fn actor(&self) -> Result<Actor, ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "identity".into(),
            });
        }
        if !self.email.contains('@') {
            return Err(ConfigError::InvalidValue {
                field: "identity.email".into(),
                reason: format!("'{}' is not an email address", self.email),
            });
        }
        Ok(Actor::new(&self.user_id, &self.email, self.role))
    }
}
