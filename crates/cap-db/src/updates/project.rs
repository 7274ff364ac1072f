//! Project update builder.

use cap_core::enums::ProjectStatus;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_raise: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_shares: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_valuation: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_round: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_entity: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<Option<String>>,
}

pub struct ProjectUpdateBuilder(ProjectUpdate);

impl ProjectUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(ProjectUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.0.status = Some(status);
        self
    }

    #[must_use]
    pub fn project_type(mut self, project_type: impl Into<String>) -> Self {
        self.0.project_type = Some(project_type.into());
        self
    }

    #[must_use]
    pub fn token_symbol(mut self, token_symbol: Option<String>) -> Self {
        self.0.token_symbol = Some(token_symbol);
        self
    }

    #[must_use]
    pub fn target_raise(mut self, target_raise: f64) -> Self {
        self.0.target_raise = Some(target_raise);
        self
    }

    #[must_use]
    pub fn authorized_shares(mut self, authorized_shares: i64) -> Self {
        self.0.authorized_shares = Some(authorized_shares);
        self
    }

    #[must_use]
    pub fn share_price(mut self, share_price: f64) -> Self {
        self.0.share_price = Some(share_price);
        self
    }

    #[must_use]
    pub fn company_valuation(mut self, company_valuation: Option<f64>) -> Self {
        self.0.company_valuation = Some(company_valuation);
        self
    }

    #[must_use]
    pub fn funding_round(mut self, funding_round: Option<String>) -> Self {
        self.0.funding_round = Some(funding_round);
        self
    }

    #[must_use]
    pub fn legal_entity(mut self, legal_entity: Option<String>) -> Self {
        self.0.legal_entity = Some(legal_entity);
        self
    }

    #[must_use]
    pub fn jurisdiction(mut self, jurisdiction: Option<String>) -> Self {
        self.0.jurisdiction = Some(jurisdiction);
        self
    }

    #[must_use]
    pub fn tax_id(mut self, tax_id: Option<String>) -> Self {
        self.0.tax_id = Some(tax_id);
        self
    }

    #[must_use]
    pub fn build(self) -> ProjectUpdate {
        self.0
    }
}

impl Default for ProjectUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
