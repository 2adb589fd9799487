//! Service department: catalog, work orders and technicians
//!
//! The three collections live under `/services/*` on the backend and share
//! the work-order status vocabulary used by reports.

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ========== Catalog ==========

/// A service offered by the shop ("Oil Change", "Brake Inspection", ...)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCatalogItem {
    /// Backend id
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Longer description
    pub description: Option<String>,
    /// Grouping such as "maintenance" or "repair"
    pub category: Option<String>,
    /// List price
    #[serde(default)]
    pub price: f64,
    /// Estimated labour time
    pub duration_minutes: Option<u32>,
    /// Whether the service can be booked
    #[serde(default = "default_true", alias = "isActive")]
    pub active: bool,
    /// Fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const fn default_true() -> bool {
    true
}

/// Create payload for a catalog entry
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    /// Display name
    pub name: String,
    /// List price
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// Partial update of a catalog entry
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Catalog list filter
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub category: Option<String>,
    pub active: Option<bool>,
}

/// `GET /services/catalog/stats/overview`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogStats {
    pub total_services: u64,
    pub active_services: u64,
    pub average_price: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Service catalog collection
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceCatalog;

impl Resource for ServiceCatalog {
    type Entity = ServiceCatalogItem;
    type Draft = ServiceDraft;
    type Patch = ServicePatch;
    type Filter = ServiceFilter;
    type Stats = CatalogStats;

    const DOMAIN: &'static str = "catalog";
    const PATH: &'static str = "services/catalog";
    const COLLECTION_KEY: &'static str = "services";
    const LABEL: &'static str = "Service";

    fn validate_draft(draft: &ServiceDraft) -> Result<(), String> {
        require(&draft.name, "Service name")?;
        if draft.price.is_finite() && draft.price >= 0.0 {
            Ok(())
        } else {
            Err("Price must be zero or more".to_string())
        }
    }
}

// ========== Work orders ==========

/// Lifecycle of a work order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    /// Created, not started
    #[default]
    Pending,
    /// Being worked on
    #[serde(alias = "in-progress", alias = "inProgress")]
    InProgress,
    /// Finished
    Completed,
    /// Abandoned
    Cancelled,
    /// Any status this client does not know
    #[serde(other)]
    Other,
}

impl WorkOrderStatus {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One service line on a work order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderLine {
    pub service_id: Option<EntityId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "one")]
    pub quantity: f64,
}

const fn one() -> f64 {
    1.0
}

/// A job performed on a vehicle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    /// Backend id
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    /// Human-facing number ("WO-1042")
    pub order_number: Option<String>,
    pub customer_id: Option<EntityId>,
    pub vehicle_id: Option<EntityId>,
    /// Assigned technician
    pub technician_id: Option<EntityId>,
    #[serde(default)]
    pub status: WorkOrderStatus,
    pub priority: Option<String>,
    /// Services performed
    #[serde(default)]
    pub services: Vec<WorkOrderLine>,
    #[serde(default)]
    pub total_amount: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Create payload for a work order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderDraft {
    pub customer_id: EntityId,
    pub vehicle_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<WorkOrderLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update of a work order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkOrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<WorkOrderLine>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Work-order list filter
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<WorkOrderStatus>,
    pub technician_id: Option<EntityId>,
    pub customer_id: Option<EntityId>,
    pub priority: Option<String>,
}

/// `GET /services/work-orders/stats/overview`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkOrderStats {
    pub total_work_orders: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub total_revenue: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Work-order collection
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkOrders;

impl Resource for WorkOrders {
    type Entity = WorkOrder;
    type Draft = WorkOrderDraft;
    type Patch = WorkOrderPatch;
    type Filter = WorkOrderFilter;
    type Stats = WorkOrderStats;

    const DOMAIN: &'static str = "work_orders";
    const PATH: &'static str = "services/work-orders";
    const COLLECTION_KEY: &'static str = "workOrders";
    const LABEL: &'static str = "Work order";

    fn validate_draft(draft: &WorkOrderDraft) -> Result<(), String> {
        require(draft.customer_id.as_str(), "Customer")?;
        require(draft.vehicle_id.as_str(), "Vehicle")
    }
}

// ========== Technicians ==========

/// A technician on staff
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub specializations: Vec<String>,
    pub hourly_rate: Option<f64>,
    #[serde(default = "default_true", alias = "isActive")]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Technician {
    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Create payload for a technician
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianDraft {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specializations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
}

/// Partial update of a technician
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specializations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Technician list filter
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub specialization: Option<String>,
    pub active: Option<bool>,
}

/// `GET /services/technicians/stats/overview`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TechnicianStats {
    pub total_technicians: u64,
    pub active_technicians: u64,
    pub average_hourly_rate: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Technician collection
#[derive(Clone, Copy, Debug, Default)]
pub struct Technicians;

impl Resource for Technicians {
    type Entity = Technician;
    type Draft = TechnicianDraft;
    type Patch = TechnicianPatch;
    type Filter = TechnicianFilter;
    type Stats = TechnicianStats;

    const DOMAIN: &'static str = "technicians";
    const PATH: &'static str = "services/technicians";
    const COLLECTION_KEY: &'static str = "technicians";
    const LABEL: &'static str = "Technician";

    fn validate_draft(draft: &TechnicianDraft) -> Result<(), String> {
        require(&draft.first_name, "First name")?;
        require(&draft.last_name, "Last name")
    }
}

entity!(ServiceCatalogItem, WorkOrder, Technician);
