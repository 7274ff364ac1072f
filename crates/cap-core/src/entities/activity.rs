use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ActivityStatus;

/// An append-only activity (audit) log entry. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ActivityEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    /// `<verb>_<table>`, e.g. `create_projects`, `auth_login`.
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub project_id: Option<String>,
    pub details: Option<String>,
    pub status: ActivityStatus,
}

/// Caller-supplied fields for a new activity entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewActivity {
    pub action: String,
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub project_id: Option<String>,
    pub details: Option<String>,
    /// Defaults to `success` when `None`.
    pub status: Option<ActivityStatus>,
}

impl NewActivity {
    #[must_use]
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }
}
