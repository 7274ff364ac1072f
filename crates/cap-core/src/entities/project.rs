use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ProjectStatus;

/// A token-issuance or fundraising project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Project {
    pub id: String,
    /// Unique across all projects.
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub project_type: String,
    pub token_symbol: Option<String>,
    pub target_raise: f64,
    pub authorized_shares: i64,
    pub share_price: f64,
    pub company_valuation: Option<f64>,
    pub funding_round: Option<String>,
    pub legal_entity: Option<String>,
    pub jurisdiction: Option<String>,
    pub tax_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub project_type: String,
    pub token_symbol: Option<String>,
    pub target_raise: f64,
    pub authorized_shares: i64,
    pub share_price: f64,
    pub company_valuation: Option<f64>,
    pub funding_round: Option<String>,
    pub legal_entity: Option<String>,
    pub jurisdiction: Option<String>,
    pub tax_id: Option<String>,
}

impl NewProject {
    /// Minimal draft project with zeroed financial terms.
    #[must_use]
    pub fn draft(name: impl Into<String>, project_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: ProjectStatus::Draft,
            project_type: project_type.into(),
            token_symbol: None,
            target_raise: 0.0,
            authorized_shares: 0,
            share_price: 0.0,
            company_valuation: None,
            funding_round: None,
            legal_entity: None,
            jurisdiction: None,
            tax_id: None,
        }
    }
}

/// The ownership ledger of a project. At most one per project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CapTable {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Link between a cap table and an investor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CapTableInvestor {
    pub id: String,
    pub cap_table_id: String,
    pub investor_id: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregates shown on a project card.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ProjectStatistics {
    pub project_id: String,
    /// Distinct investors holding a subscription in the project.
    pub investor_count: u64,
    /// Sum of subscription fiat amounts.
    pub total_raised: f64,
}
