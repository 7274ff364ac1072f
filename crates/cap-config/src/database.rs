//! libSQL connection configuration.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    ".captable/captable.db".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Local database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Remote database URL (e.g. `libsql://captable-acme.turso.io`).
    /// When set together with `auth_token`, the remote database is used
    /// instead of `path`.
    #[serde(default)]
    pub url: String,

    /// Auth token for the remote database.
    #[serde(default)]
    pub auth_token: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            url: String::new(),
            auth_token: String::new(),
        }
    }
}

impl DatabaseConfig {
    /// Check if the remote database has the minimum required fields.
    pub fn is_remote(&self) -> bool {
        !self.url.is_empty() && !self.auth_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local() {
        let config = DatabaseConfig::default();
        assert!(!config.is_remote());
        assert_eq!(config.path, ".captable/captable.db");
    }

    #[test]
    fn remote_needs_url_and_token() {
        let mut config = DatabaseConfig {
            url: "libsql://captable.turso.io".into(),
            ..Default::default()
        };
        assert!(!config.is_remote());
        config.auth_token = "token".into();
        assert!(config.is_remote());
    }
}
