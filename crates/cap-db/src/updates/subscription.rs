//! Subscription update builder.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiat_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distributed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

pub struct SubscriptionUpdateBuilder(SubscriptionUpdate);

impl SubscriptionUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(SubscriptionUpdate::default())
    }

    #[must_use]
    pub fn subscription_ref(mut self, subscription_ref: impl Into<String>) -> Self {
        self.0.subscription_ref = Some(subscription_ref.into());
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.0.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn fiat_amount(mut self, fiat_amount: f64) -> Self {
        self.0.fiat_amount = Some(fiat_amount);
        self
    }

    #[must_use]
    pub fn subscription_date(mut self, subscription_date: DateTime<Utc>) -> Self {
        self.0.subscription_date = Some(subscription_date);
        self
    }

    #[must_use]
    pub fn confirmed(mut self, confirmed: bool) -> Self {
        self.0.confirmed = Some(confirmed);
        self
    }

    #[must_use]
    pub fn allocated(mut self, allocated: bool) -> Self {
        self.0.allocated = Some(allocated);
        self
    }

    #[must_use]
    pub fn distributed(mut self, distributed: bool) -> Self {
        self.0.distributed = Some(distributed);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.0.notes = Some(notes);
        self
    }

    #[must_use]
    pub fn build(self) -> SubscriptionUpdate {
        self.0
    }
}

impl Default for SubscriptionUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
