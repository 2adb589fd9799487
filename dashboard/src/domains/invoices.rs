//! Invoices

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Payment state of an invoice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Not yet sent
    #[default]
    Draft,
    /// Sent, awaiting payment
    #[serde(alias = "pending")]
    Sent,
    /// Fully paid
    Paid,
    /// Past due date, unpaid
    Overdue,
    /// Voided
    #[serde(alias = "void")]
    Cancelled,
    /// Any status this client does not know
    #[serde(other)]
    Other,
}

impl InvoiceStatus {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One billed line
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    /// Catalog entry this line bills, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<EntityId>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
    /// Line total as computed by the backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

impl InvoiceLine {
    /// The backend's line total, or quantity × unit price
    #[must_use]
    pub fn amount(&self) -> f64 {
        self.total.unwrap_or(self.quantity * self.unit_price)
    }
}

/// A customer invoice
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Backend id
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    /// Human-facing number ("INV-2024-0012")
    pub invoice_number: Option<String>,
    pub customer_id: Option<EntityId>,
    pub work_order_id: Option<EntityId>,
    #[serde(default)]
    pub status: InvoiceStatus,
    /// Billed lines
    #[serde(default, alias = "lineItems")]
    pub items: Vec<InvoiceLine>,
    #[serde(default)]
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    /// Amount due
    #[serde(default, alias = "totalAmount")]
    pub total: f64,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    /// Fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Invoice {
    /// Date the invoice counts towards in reports
    #[must_use]
    pub fn report_date(&self) -> Option<DateTime<Utc>> {
        self.issue_date.or(self.created_at)
    }
}

/// Create payload
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub customer_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_order_id: Option<EntityId>,
    pub items: Vec<InvoiceLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update payload
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<InvoiceLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// List filter
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<EntityId>,
    /// Issued on or after
    pub start_date: Option<DateTime<Utc>>,
    /// Issued on or before
    pub end_date: Option<DateTime<Utc>>,
}

/// `GET /invoices/stats/overview`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceStats {
    pub total_invoices: u64,
    pub total_revenue: f64,
    pub outstanding_amount: f64,
    pub overdue_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Invoice collection
#[derive(Clone, Copy, Debug, Default)]
pub struct Invoices;

impl Resource for Invoices {
    type Entity = Invoice;
    type Draft = InvoiceDraft;
    type Patch = InvoicePatch;
    type Filter = InvoiceFilter;
    type Stats = InvoiceStats;

    const DOMAIN: &'static str = "invoices";
    const PATH: &'static str = "invoices";
    const COLLECTION_KEY: &'static str = "invoices";
    const LABEL: &'static str = "Invoice";

    fn validate_draft(draft: &InvoiceDraft) -> Result<(), String> {
        require(draft.customer_id.as_str(), "Customer")?;
        if draft.items.is_empty() {
            return Err("An invoice needs at least one line item".to_string());
        }
        if draft.items.iter().any(|line| line.description.trim().is_empty()) {
            return Err("Every line item needs a description".to_string());
        }
        Ok(())
    }
}

entity!(Invoice);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_amount_falls_back_to_quantity_times_price() {
        let line = InvoiceLine {
            quantity: 2.0,
            unit_price: 25.0,
            ..InvoiceLine::default()
        };
        assert!((line.amount() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decodes_alternate_field_names() {
        let invoice: Invoice = serde_json::from_value(json!({
            "_id": "inv-1",
            "status": "pending",
            "lineItems": [{ "description": "Brake pads", "quantity": 1, "unitPrice": 80 }],
            "totalAmount": 86.4,
            "createdAt": "2025-01-10T09:00:00Z"
        }))
        .unwrap();

        assert_eq!(invoice.status, InvoiceStatus::Sent);
        assert_eq!(invoice.items.len(), 1);
        assert!((invoice.total - 86.4).abs() < f64::EPSILON);
        assert_eq!(invoice.report_date(), invoice.created_at);
    }

    #[test]
    fn draft_needs_lines() {
        let draft = InvoiceDraft {
            customer_id: EntityId::from("c-1"),
            ..InvoiceDraft::default()
        };
        assert!(Invoices::validate_draft(&draft).is_err());
    }
}
