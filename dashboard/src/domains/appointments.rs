//! Appointments

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Booking state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    #[serde(alias = "in-progress", alias = "inProgress")]
    InProgress,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
    #[serde(alias = "no-show", alias = "noShow")]
    NoShow,
    #[serde(other)]
    Other,
}

/// A booked visit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    pub customer_id: Option<EntityId>,
    pub vehicle_id: Option<EntityId>,
    pub technician_id: Option<EntityId>,
    pub service_type: Option<String>,
    /// Start of the slot
    #[serde(alias = "date", alias = "scheduledAt")]
    pub scheduled_date: Option<DateTime<Utc>>,
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub customer_id: EntityId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFilter {
    #[serde(flatten)]
    pub paging: Paging,
    pub status: Option<AppointmentStatus>,
    pub technician_id: Option<EntityId>,
    pub date: Option<chrono::NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentStats {
    pub total_appointments: u64,
    pub today: u64,
    pub upcoming: u64,
    pub completed: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Appointment collection
#[derive(Clone, Copy, Debug, Default)]
pub struct Appointments;

impl Resource for Appointments {
    type Entity = Appointment;
    type Draft = AppointmentDraft;
    type Patch = AppointmentPatch;
    type Filter = AppointmentFilter;
    type Stats = AppointmentStats;

    const DOMAIN: &'static str = "appointments";
    const PATH: &'static str = "appointments";
    const COLLECTION_KEY: &'static str = "appointments";
    const LABEL: &'static str = "Appointment";

    fn validate_draft(draft: &AppointmentDraft) -> Result<(), String> {
        require(draft.customer_id.as_str(), "Customer")?;
        if draft.scheduled_date.is_none() {
            return Err("Date and time are required".to_string());
        }
        Ok(())
    }
}

entity!(Appointment);
