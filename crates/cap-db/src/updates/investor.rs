//! Investor update builders: profile fields and KYC bookkeeping.

use chrono::{DateTime, Utc};
use cap_core::enums::KycStatus;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct InvestorUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investor_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<Option<String>>,
}

pub struct InvestorUpdateBuilder(InvestorUpdate);

impl InvestorUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(InvestorUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.0.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn investor_type(mut self, investor_type: impl Into<String>) -> Self {
        self.0.investor_type = Some(investor_type.into());
        self
    }

    #[must_use]
    pub fn company(mut self, company: Option<String>) -> Self {
        self.0.company = Some(company);
        self
    }

    #[must_use]
    pub fn wallet_address(mut self, wallet_address: Option<String>) -> Self {
        self.0.wallet_address = Some(wallet_address);
        self
    }

    #[must_use]
    pub fn build(self) -> InvestorUpdate {
        self.0
    }
}

impl Default for InvestorUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A KYC outcome. Any status may be recorded over any other.
#[derive(Debug, Clone, Serialize)]
pub struct KycUpdate {
    pub status: KycStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_details: Option<serde_json::Value>,
}

impl KycUpdate {
    #[must_use]
    pub const fn status(status: KycStatus) -> Self {
        Self {
            status,
            expiry_date: None,
            verification_details: None,
        }
    }

    #[must_use]
    pub const fn expiring(mut self, expiry_date: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.verification_details = Some(details);
        self
    }
}
