//! Token allocation update builder.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct AllocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_tx_hash: Option<Option<String>>,
}

pub struct AllocationUpdateBuilder(AllocationUpdate);

impl AllocationUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(AllocationUpdate::default())
    }

    #[must_use]
    pub fn token_amount(mut self, token_amount: f64) -> Self {
        self.0.token_amount = Some(token_amount);
        self
    }

    #[must_use]
    pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
        self.0.token_type = Some(token_type.into());
        self
    }

    #[must_use]
    pub fn distributed(mut self, distributed: bool) -> Self {
        self.0.distributed = Some(distributed);
        self
    }

    #[must_use]
    pub fn distribution_date(mut self, distribution_date: Option<DateTime<Utc>>) -> Self {
        self.0.distribution_date = Some(distribution_date);
        self
    }

    #[must_use]
    pub fn distribution_tx_hash(mut self, distribution_tx_hash: Option<String>) -> Self {
        self.0.distribution_tx_hash = Some(distribution_tx_hash);
        self
    }

    /// Mark distributed now with the given transaction hash.
    #[must_use]
    pub fn distributed_with(self, tx_hash: impl Into<String>) -> Self {
        self.distributed(true)
            .distribution_date(Some(Utc::now()))
            .distribution_tx_hash(Some(tx_hash.into()))
    }

    #[must_use]
    pub fn build(self) -> AllocationUpdate {
        self.0
    }
}

impl Default for AllocationUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
