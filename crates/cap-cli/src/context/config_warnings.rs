use cap_config::CapConfig;

/// Emit warnings for likely mistyped env var keys and half-configured sections.
pub fn warn_unconfigured(config: &CapConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &CapConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.identity.is_configured() && has_env_prefix(&env_keys, "CAPTABLE_IDENTITY") {
        warnings.push(
            "Identity config appears default while CAPTABLE_IDENTITY* env vars exist. Use double underscores (example: CAPTABLE_IDENTITY__EMAIL)."
                .to_string(),
        );
    }

    let database = &config.database;
    if database.url.is_empty() != database.auth_token.is_empty() {
        warnings.push(
            "Remote database needs both database.url and database.auth_token; using the local database."
                .to_string(),
        );
    } else if !database.is_remote()
        && has_env_prefix(&env_keys, "CAPTABLE_DATABASE_")
        && !has_env_prefix(&env_keys, "CAPTABLE_DATABASE__")
    {
        warnings.push(
            "Database config appears default while CAPTABLE_DATABASE* env vars exist. Use double underscores (example: CAPTABLE_DATABASE__URL)."
                .to_string(),
        );
    }

    warnings
}

fn has_env_prefix(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| key.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use cap_config::{CapConfig, DatabaseConfig, IdentityConfig};
    use cap_core::enums::Role;

    use super::collect_unconfigured_warnings;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn warns_for_single_underscore_keys() {
        let config = CapConfig::default();
        let warnings = collect_unconfigured_warnings(
            &config,
            env(&[
                ("CAPTABLE_IDENTITY_EMAIL", "ops@example.com"),
                ("CAPTABLE_DATABASE_URL", "libsql://demo"),
            ]),
        );
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn warns_for_half_configured_remote() {
        let config = CapConfig {
            database: DatabaseConfig {
                url: "libsql://demo".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let warnings = collect_unconfigured_warnings(&config, Vec::new());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("auth_token"));
    }

    #[test]
    fn does_not_warn_when_sections_are_configured() {
        let config = CapConfig {
            identity: IdentityConfig {
                user_id: "usr-1".to_string(),
                email: "ops@example.com".to_string(),
                role: Role::Manager,
            },
            database: DatabaseConfig {
                url: "libsql://demo".to_string(),
                auth_token: "token".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let warnings = collect_unconfigured_warnings(
            &config,
            env(&[
                ("CAPTABLE_IDENTITY__EMAIL", "ops@example.com"),
                ("CAPTABLE_DATABASE__URL", "libsql://demo"),
            ]),
        );
        assert!(warnings.is_empty());
    }
}
