use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::RedemptionStatus;

/// An investor's request to convert tokens back to cash.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RedemptionRequest {
    pub id: String,
    pub investor_id: String,
    pub token_amount: f64,
    pub token_type: String,
    pub status: RedemptionStatus,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new redemption request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewRedemption {
    pub token_amount: f64,
    pub token_type: String,
}

/// One approver's sign-off slot on a redemption request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RedemptionApprover {
    pub id: String,
    pub redemption_id: String,
    pub approver_id: String,
    pub approved: bool,
    pub approved_at: Option<DateTime<Utc>>,
}
