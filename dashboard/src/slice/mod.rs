//! Generic async-CRUD slice
//!
//! One implementation of the list/get/stats/create/update/delete lifecycle,
//! instantiated per domain through the [`Resource`] trait:
//!
//! - [`ResourceService`]: one HTTP call per endpoint
//! - [`thunk`]: request effects (pending → fulfilled | rejected)
//! - [`CrudReducer`]: state transitions over [`CollectionState`]

pub mod action;
pub mod entity;
pub mod reducer;
pub mod resource;
pub mod service;
pub mod state;
pub mod thunk;

pub use action::{CrudAction, Fulfilled, Operation};
pub use entity::{Entity, EntityId, RequestId};
pub use reducer::{CrudReducer, SliceState};
pub use resource::{Resource, DEFAULT_STATS_PATH};
pub use service::ResourceService;
pub use state::CollectionState;

use shopdesk_api::Transport;
use shopdesk_core::environment::{Clock, Notifier, SystemClock};
use std::sync::Arc;

/// Dependencies injected into every slice
#[derive(Clone)]
pub struct SliceEnvironment {
    /// Backend transport
    pub transport: Arc<dyn Transport>,
    /// Destination of user-facing notifications
    pub notifier: Arc<dyn Notifier>,
    /// Time source for report windows
    pub clock: Arc<dyn Clock>,
}

impl SliceEnvironment {
    /// Environment using the wall clock
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            transport,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Service for resource `R` over this environment's transport
    #[must_use]
    pub fn service<R: Resource>(&self) -> ResourceService<R> {
        ResourceService::new(Arc::clone(&self.transport))
    }
}

impl std::fmt::Debug for SliceEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceEnvironment").finish_non_exhaustive()
    }
}
