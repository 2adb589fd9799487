//! Per-domain resources
//!
//! Each module declares the backend's record shape for one collection and a
//! zero-sized [`Resource`](crate::slice::Resource) marker that instantiates
//! the generic slice for it.

use serde::{Deserialize, Serialize};

pub mod appointments;
pub mod campaigns;
pub mod customers;
pub mod invoices;
pub mod memberships;
pub mod services;
pub mod tasks;
pub mod vehicles;

pub use appointments::Appointments;
pub use campaigns::Campaigns;
pub use customers::Customers;
pub use invoices::Invoices;
pub use memberships::MembershipPlans;
pub use services::{ServiceCatalog, Technicians, WorkOrders};
pub use tasks::Tasks;
pub use vehicles::Vehicles;

/// Paging parameters accepted by every list endpoint
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// 1-based page
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Free-text search
    pub search: Option<String>,
    /// Sort field
    pub sort_by: Option<String>,
}

/// Implement [`Entity`](crate::slice::Entity) for records with an `id: EntityId` field
macro_rules! entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::slice::Entity for $ty {
                fn id(&self) -> &$crate::slice::EntityId {
                    &self.id
                }
            }
        )+
    };
}

pub(crate) use entity;
