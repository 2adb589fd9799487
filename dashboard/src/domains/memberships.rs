//! Membership plans

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How often a plan bills
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    #[serde(alias = "annual", alias = "annually")]
    Yearly,
    #[serde(other)]
    Other,
}

/// A subscription plan customers can join
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlan {
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    /// Perks listed on the plan card
    #[serde(default)]
    pub benefits: Vec<String>,
    /// Discount applied to services, in percent
    pub discount_percentage: Option<f64>,
    #[serde(default, alias = "isActive")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlanDraft {
    pub name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub benefits: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPlanFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub active: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MembershipStats {
    pub total_plans: u64,
    pub active_members: u64,
    pub monthly_recurring_revenue: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Membership plan collection
#[derive(Clone, Copy, Debug, Default)]
pub struct MembershipPlans;

impl Resource for MembershipPlans {
    type Entity = MembershipPlan;
    type Draft = MembershipPlanDraft;
    type Patch = MembershipPlanPatch;
    type Filter = MembershipPlanFilter;
    type Stats = MembershipStats;

    const DOMAIN: &'static str = "memberships";
    const PATH: &'static str = "memberships/plans";
    const COLLECTION_KEY: &'static str = "plans";
    const LABEL: &'static str = "Membership plan";

    fn validate_draft(draft: &MembershipPlanDraft) -> Result<(), String> {
        require(&draft.name, "Plan name")?;
        match draft.discount_percentage {
            Some(discount) if !(0.0..=100.0).contains(&discount) => {
                Err("Discount must be between 0 and 100".to_string())
            },
            _ => Ok(()),
        }
    }
}

entity!(MembershipPlan);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_is_bounded() {
        let draft = MembershipPlanDraft {
            name: "Gold".to_string(),
            discount_percentage: Some(120.0),
            ..MembershipPlanDraft::default()
        };
        assert!(MembershipPlans::validate_draft(&draft).is_err());
    }
}
