use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An investor's commitment of funds to a project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub investor_id: String,
    pub project_id: String,
    /// External subscription reference (agreement number).
    pub subscription_ref: String,
    pub currency: String,
    pub fiat_amount: f64,
    pub subscription_date: DateTime<Utc>,
    pub confirmed: bool,
    pub allocated: bool,
    pub distributed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new subscription.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewSubscription {
    pub subscription_ref: String,
    pub currency: String,
    pub fiat_amount: f64,
    pub subscription_date: DateTime<Utc>,
    pub confirmed: bool,
    pub allocated: bool,
    pub distributed: bool,
    pub notes: Option<String>,
}

impl NewSubscription {
    /// Unconfirmed subscription dated now.
    #[must_use]
    pub fn new(subscription_ref: impl Into<String>, currency: impl Into<String>, fiat_amount: f64) -> Self {
        Self {
            subscription_ref: subscription_ref.into(),
            currency: currency.into(),
            fiat_amount,
            subscription_date: Utc::now(),
            confirmed: false,
            allocated: false,
            distributed: false,
            notes: None,
        }
    }
}

/// The portion of issued tokens assigned to a subscription.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TokenAllocation {
    pub id: String,
    pub subscription_id: String,
    pub token_amount: f64,
    pub token_type: String,
    pub distributed: bool,
    pub distribution_date: Option<DateTime<Utc>>,
    pub distribution_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new token allocation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewAllocation {
    pub token_amount: f64,
    pub token_type: String,
    pub distributed: bool,
    pub distribution_date: Option<DateTime<Utc>>,
    pub distribution_tx_hash: Option<String>,
}

impl NewAllocation {
    #[must_use]
    pub fn undistributed(token_amount: f64, token_type: impl Into<String>) -> Self {
        Self {
            token_amount,
            token_type: token_type.into(),
            distributed: false,
            distribution_date: None,
            distribution_tx_hash: None,
        }
    }
}

/// A subscription joined with its allocations and project name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SubscriptionWithAllocations {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub project_name: String,
    pub allocations: Vec<TokenAllocation>,
}
