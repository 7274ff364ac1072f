//! TOML loading through the full provider chain, sandboxed with `figment::Jail`.

use cap_config::CapConfig;
use cap_core::enums::{Permission, Role};
use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use pretty_assertions::assert_eq;

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[database]
path = "./ledger.db"

[identity]
user_id = "usr-42"
email = "cfo@example.com"
role = "compliance"

[activity]
page_size = 50
export_dir = "./exports"

[general]
default_limit = 10
"#,
        )?;

        let config: CapConfig = Figment::from(Serialized::defaults(CapConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.database.path, "./ledger.db");
        assert_eq!(config.identity.user_id, "usr-42");
        assert_eq!(config.identity.role, Role::Compliance);
        assert_eq!(config.activity.page_size, 50);
        assert_eq!(config.activity.export_dir, "./exports");
        assert_eq!(config.general.default_limit, 10);
        Ok(())
    });
}

#[test]
fn project_local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_dir(".captable")?;
        jail.create_file(
            ".captable/config.toml",
            r#"
[database]
url = "libsql://captable-acme.turso.io"
auth_token = "tok"
"#,
        )?;

        let config = CapConfig::load().expect("config loads");
        assert!(config.database.is_remote());
        assert_eq!(config.activity.page_size, 20);
        Ok(())
    });
}

#[test]
fn partial_section_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[activity]\nexport_dir = \"/tmp\"\n")?;

        let config: CapConfig = Figment::from(Serialized::defaults(CapConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.activity.export_dir, "/tmp");
        assert_eq!(config.activity.page_size, 20);
        assert_eq!(config.database.path, ".captable/captable.db");
        Ok(())
    });
}

#[test]
fn unknown_role_fails_to_load() {
    Jail::expect_with(|jail| {
        jail.create_dir(".captable")?;
        jail.create_file(".captable/config.toml", "[identity]\nrole = \"superuser\"\n")?;

        assert!(CapConfig::load().is_err());
        Ok(())
    });
}

#[test]
fn policy_table_overrides_one_role() {
    Jail::expect_with(|jail| {
        jail.create_dir(".captable")?;
        jail.create_file(
            ".captable/config.toml",
            r#"
[policy]
manager = ["create", "update", "delete"]
"#,
        )?;

        let config = CapConfig::load().expect("config loads");
        assert!(config.policy.allows(Role::Manager, Permission::Delete));
        assert_eq!(config.policy.compliance, Role::Compliance.permissions());
        assert!(config.policy.allows(Role::Admin, Permission::ManageKyc));
        Ok(())
    });
}

#[test]
fn unknown_permission_fails_to_load() {
    Jail::expect_with(|jail| {
        jail.create_dir(".captable")?;
        jail.create_file(".captable/config.toml", "[policy]\nviewer = [\"approve\"]\n")?;

        assert!(CapConfig::load().is_err());
        Ok(())
    });
}
