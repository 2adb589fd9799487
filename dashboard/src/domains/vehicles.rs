//! Customer vehicles

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A vehicle owned by a customer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Backend id
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    /// Owner
    pub customer_id: Option<EntityId>,
    /// Manufacturer
    #[serde(default)]
    pub make: String,
    /// Model
    #[serde(default)]
    pub model: String,
    /// Model year
    pub year: Option<u16>,
    /// Vehicle identification number
    pub vin: Option<String>,
    /// Registration plate
    pub license_plate: Option<String>,
    /// Odometer reading
    pub mileage: Option<u32>,
    /// Fields not modelled here
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Create payload
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    pub customer_id: EntityId,
    pub make: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
}

/// Partial update payload
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
}

/// List filter
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleFilter {
    #[serde(flatten)]
    pub paging: Paging,
    /// Only this customer's vehicles
    pub customer_id: Option<EntityId>,
    pub make: Option<String>,
}

/// `GET /vehicles/stats/overview`
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VehicleStats {
    pub total_vehicles: u64,
    pub average_mileage: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Vehicles collection
#[derive(Clone, Copy, Debug, Default)]
pub struct Vehicles;

impl Resource for Vehicles {
    type Entity = Vehicle;
    type Draft = VehicleDraft;
    type Patch = VehiclePatch;
    type Filter = VehicleFilter;
    type Stats = VehicleStats;

    const DOMAIN: &'static str = "vehicles";
    const PATH: &'static str = "vehicles";
    const COLLECTION_KEY: &'static str = "vehicles";
    const LABEL: &'static str = "Vehicle";

    fn validate_draft(draft: &VehicleDraft) -> Result<(), String> {
        require(draft.customer_id.as_str(), "Customer")?;
        require(&draft.make, "Make")?;
        require(&draft.model, "Model")
    }
}

entity!(Vehicle);
