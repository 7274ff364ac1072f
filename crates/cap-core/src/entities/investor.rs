use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::KycStatus;

/// A natural or legal person subscribing to projects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Investor {
    pub id: String,
    pub name: String,
    pub email: String,
    /// `individual`, `institutional`, `corporate`, ...
    pub investor_type: String,
    pub company: Option<String>,
    pub kyc_status: KycStatus,
    pub kyc_expiry_date: Option<DateTime<Utc>>,
    pub verification_details: Option<serde_json::Value>,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new investor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewInvestor {
    pub name: String,
    pub email: String,
    pub investor_type: String,
    pub company: Option<String>,
    pub wallet_address: Option<String>,
}

impl NewInvestor {
    #[must_use]
    pub fn individual(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            investor_type: "individual".to_string(),
            company: None,
            wallet_address: None,
        }
    }
}

/// A named set of investors (e.g. a syndicate).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InvestorGroup {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Membership row in `investor_groups_investors`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct InvestorGroupMember {
    pub id: String,
    pub group_id: String,
    pub investor_id: String,
}
