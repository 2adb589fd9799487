//! # Shopdesk
//!
//! Client-side state core for a service-shop back office: customers,
//! vehicles, service catalog, work orders, technicians, invoices,
//! appointments, tasks, membership plans and campaigns.
//!
//! Server state is mirrored into one [`CollectionState`](slice::CollectionState)
//! per domain. Every domain runs the same generic slice:
//!
//! 1. A request action (e.g. [`CrudAction::create`](slice::CrudAction::create))
//!    marks the request in flight and returns a cancellable effect
//! 2. The effect calls the backend through [`ResourceService`](slice::ResourceService)
//! 3. The outcome comes back as `Fulfilled` or `Rejected` and is applied to
//!    exactly one sub-resource (items or stats)
//!
//! ## Example
//!
//! ```no_run
//! use shopdesk::app::{build_store, AppAction};
//! use shopdesk::domains::services::{ServiceCatalog, ServiceDraft};
//! use shopdesk::notify::TracingNotifier;
//! use shopdesk::slice::{CrudAction, SliceEnvironment};
//! use shopdesk_api::ApiClient;
//! use shopdesk_runtime::StoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("http://localhost:5000/api", Duration::from_secs(30))?;
//! let env = SliceEnvironment::new(Arc::new(client), Arc::new(TracingNotifier));
//! let store = build_store(env, StoreConfig::default());
//!
//! let create = CrudAction::<ServiceCatalog>::create(ServiceDraft {
//!     name: "Oil Change".to_string(),
//!     price: 49.99,
//!     ..ServiceDraft::default()
//! });
//! let request_id = create.request_id().cloned();
//! store
//!     .send_and_wait_for(
//!         AppAction::from(create),
//!         move |action| request_id.as_ref().is_some_and(|id| action.settles(id)),
//!         Duration::from_secs(30),
//!     )
//!     .await?;
//!
//! let services = store.state(|s| s.catalog.len()).await;
//! println!("{services} services");
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod domains;
pub mod notify;
pub mod reports;
pub mod slice;

pub use app::{build_store, AppAction, AppState, AppStore};
pub use config::{Config, ConfigError};
pub use reports::{compute_metrics, DateWindow, MetricsMemo, RangePreset, ReportMetrics};
