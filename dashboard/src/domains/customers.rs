//! Customers

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A shop customer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Backend id
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Email address
    pub email: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Active membership plan, if any
    pub membership_plan_id: Option<EntityId>,
    /// Registration time
    pub created_at: Option<DateTime<Utc>>,
    /// Fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Customer {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Create payload
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Partial update payload
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Postal address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Membership plan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_plan_id: Option<EntityId>,
}

/// List filter
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    /// Paging and search
    #[serde(flatten)]
    pub paging: Paging,
    /// Only customers holding this plan
    pub membership_plan_id: Option<EntityId>,
}

/// `GET /customers/stats/overview`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerStats {
    /// All customers
    pub total_customers: u64,
    /// Customers registered this month
    pub new_this_month: u64,
    /// Customers with an active membership
    pub active_members: u64,
    /// Fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Customers collection
#[derive(Clone, Copy, Debug, Default)]
pub struct Customers;

impl Resource for Customers {
    type Entity = Customer;
    type Draft = CustomerDraft;
    type Patch = CustomerPatch;
    type Filter = CustomerFilter;
    type Stats = CustomerStats;

    const DOMAIN: &'static str = "customers";
    const PATH: &'static str = "customers";
    const COLLECTION_KEY: &'static str = "customers";
    const LABEL: &'static str = "Customer";

    fn validate_draft(draft: &CustomerDraft) -> Result<(), String> {
        require(&draft.first_name, "First name")?;
        require(&draft.last_name, "Last name")
    }
}

entity!(Customer);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use shopdesk_api::Query;

    #[test]
    fn decodes_mongo_style_id_and_keeps_unknown_fields() {
        let customer: Customer = serde_json::from_value(json!({
            "_id": "c-1",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "loyaltyPoints": 120
        }))
        .unwrap();

        assert_eq!(customer.id, EntityId::from("c-1"));
        assert_eq!(customer.full_name(), "Ada Lovelace");
        assert_eq!(customer.extra["loyaltyPoints"], json!(120));
    }

    #[test]
    fn decodes_records_carrying_both_id_keys() {
        let customer: Customer = serde_json::from_value(json!({
            "_id": "c-1",
            "id": "c-1",
            "firstName": "Ada",
            "lastName": "Lovelace"
        }))
        .unwrap();

        assert_eq!(customer.id, EntityId::from("c-1"));
        assert!(customer.extra.is_empty());
        assert_eq!(serde_json::to_value(&customer).unwrap()["id"], json!("c-1"));
    }

    #[test]
    fn filter_flattens_paging_and_skips_unset() {
        let filter = CustomerFilter {
            paging: Paging {
                page: Some(2),
                search: Some("smith".to_string()),
                ..Paging::default()
            },
            membership_plan_id: None,
        };
        let query = Query::from_filter(&filter).unwrap();
        let keys: Vec<&str> = query.pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&"page"));
        assert!(keys.contains(&"search"));
    }

    #[test]
    fn names_are_required() {
        let draft = CustomerDraft {
            first_name: "Ada".to_string(),
            ..CustomerDraft::default()
        };
        assert_eq!(Customers::validate_draft(&draft), Err("Last name is required".to_string()));
    }
}
