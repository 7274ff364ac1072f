use cap_config::{CapConfig, ConfigError};
use cap_core::enums::{Permission, Role};
use figment::Jail;

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir(".captable")?;
        jail.create_file(
            ".captable/config.toml",
            "[database]\npath = \"from-toml.db\"\n",
        )?;
        jail.set_env("CAPTABLE_DATABASE__PATH", "from-env.db");

        let config = CapConfig::load().expect("config loads");
        assert_eq!(config.database.path, "from-env.db");
        Ok(())
    });
}

#[test]
fn identity_from_env_builds_actor() {
    Jail::expect_with(|jail| {
        jail.set_env("CAPTABLE_IDENTITY__USER_ID", "usr-7");
        jail.set_env("CAPTABLE_IDENTITY__EMAIL", "admin@example.com");
        jail.set_env("CAPTABLE_IDENTITY__ROLE", "admin");

        let config = CapConfig::load().expect("config loads");
        let actor = config.identity.actor().expect("identity configured");
        assert_eq!(actor.role, Role::Admin);
        assert_eq!(actor.user_id, "usr-7");
        Ok(())
    });
}

#[test]
fn zero_page_size_from_env_is_invalid() {
    Jail::expect_with(|jail| {
        jail.set_env("CAPTABLE_ACTIVITY__PAGE_SIZE", "0");

        let err = CapConfig::load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        Ok(())
    });
}

#[test]
fn policy_from_env_grants_viewer_updates() {
    Jail::expect_with(|jail| {
        jail.set_env("CAPTABLE_POLICY__VIEWER", r#"["update"]"#);

        let config = CapConfig::load().expect("config loads");
        assert!(config.policy.allows(Role::Viewer, Permission::Update));
        assert!(!config.policy.allows(Role::Viewer, Permission::Delete));
        assert!(config.policy.allows(Role::Admin, Permission::Delete));
        Ok(())
    });
}
