//! ID prefixes for every stored entity.
//!
//! IDs are generated by the database as `{prefix}-{8 hex chars}`,
//! e.g. `prj-a3f8b2c1`.

pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_CAP_TABLE: &str = "ctb";
pub const PREFIX_CAP_TABLE_INVESTOR: &str = "cti";
pub const PREFIX_INVESTOR: &str = "inv";
pub const PREFIX_INVESTOR_GROUP: &str = "grp";
pub const PREFIX_GROUP_MEMBER: &str = "gmb";
pub const PREFIX_SUBSCRIPTION: &str = "sub";
pub const PREFIX_ALLOCATION: &str = "alc";
pub const PREFIX_REDEMPTION: &str = "red";
pub const PREFIX_APPROVER: &str = "apr";
pub const PREFIX_WALLET: &str = "wal";
pub const PREFIX_SIGNATORY: &str = "sig";
pub const PREFIX_WHITELIST: &str = "wle";
pub const PREFIX_ACTIVITY: &str = "act";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_PROJECT,
    PREFIX_CAP_TABLE,
    PREFIX_CAP_TABLE_INVESTOR,
    PREFIX_INVESTOR,
    PREFIX_INVESTOR_GROUP,
    PREFIX_GROUP_MEMBER,
    PREFIX_SUBSCRIPTION,
    PREFIX_ALLOCATION,
    PREFIX_REDEMPTION,
    PREFIX_APPROVER,
    PREFIX_WALLET,
    PREFIX_SIGNATORY,
    PREFIX_WHITELIST,
    PREFIX_ACTIVITY,
];

/// Canonical cap-table name for a project. Rename propagation compares
/// against this exact string.
#[must_use]
pub fn cap_table_name(project_name: &str) -> String {
    format!("Cap Table - {project_name}")
}
