//! Root store composition
//!
//! Every domain slice is a [`CrudReducer`] scoped into [`AppState`] and
//! [`AppAction`]; the scoped reducers are combined into one [`AppReducer`]
//! that the runtime [`Store`] drives. An action for one domain never touches
//! another domain's slice.

use crate::domains::{
    Appointments, Campaigns, Customers, Invoices, MembershipPlans, ServiceCatalog, Tasks, Technicians,
    Vehicles, WorkOrders,
};
use crate::reports::ReportInputs;
use crate::slice::{CrudAction, CrudReducer, RequestId, SliceEnvironment, SliceState};
use shopdesk_core::composition::{combine_reducers, scope_reducer, BoxedReducer, CombinedReducer};
use shopdesk_runtime::{Store, StoreConfig, StoreError};
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};

/// Reducer for the whole application state
pub type AppReducer = CombinedReducer<AppState, AppAction, SliceEnvironment>;

/// The application store
pub type AppStore = Store<AppState, AppAction, SliceEnvironment, AppReducer>;

macro_rules! app_slices {
    ($($field:ident: $variant:ident => $resource:ty),+ $(,)?) => {
        /// Root state: one collection slice per domain
        #[derive(Clone, Debug, Default, PartialEq)]
        pub struct AppState {
            $(
                #[doc = concat!("Slice for [`", stringify!($resource), "`]")]
                pub $field: SliceState<$resource>,
            )+
        }

        /// Root action: a slice action tagged with its domain
        #[derive(Clone, Debug)]
        pub enum AppAction {
            $(
                #[doc = concat!("Action for the `", stringify!($field), "` slice")]
                $variant(CrudAction<$resource>),
            )+
        }

        $(
            impl From<CrudAction<$resource>> for AppAction {
                fn from(action: CrudAction<$resource>) -> Self {
                    Self::$variant(action)
                }
            }
        )+

        impl AppAction {
            /// Domain of the slice this action targets
            #[must_use]
            pub const fn domain(&self) -> &'static str {
                match self {
                    $(Self::$variant(_) => <$resource as $crate::slice::Resource>::DOMAIN,)+
                }
            }

            /// Request this action starts, cancels or settles
            #[must_use]
            pub const fn request_id(&self) -> Option<&RequestId> {
                match self {
                    $(Self::$variant(action) => action.request_id(),)+
                }
            }

            /// Whether this is a fulfilled or rejected action
            #[must_use]
            pub const fn is_settlement(&self) -> bool {
                match self {
                    $(Self::$variant(action) => action.is_settlement(),)+
                }
            }

            /// Whether this is a rejected action
            #[must_use]
            pub const fn is_rejection(&self) -> bool {
                match self {
                    $(Self::$variant(action) => action.is_rejection(),)+
                }
            }

            /// Whether this action settles `request_id`
            #[must_use]
            pub fn settles(&self, request_id: &RequestId) -> bool {
                match self {
                    $(Self::$variant(action) => action.settles(request_id),)+
                }
            }

            /// List-all and stats requests for every domain
            #[must_use]
            pub fn refresh_all() -> Vec<Self> {
                let mut actions = Vec::new();
                $(
                    actions.push(Self::$variant(CrudAction::<$resource>::list_all()));
                    actions.push(Self::$variant(CrudAction::<$resource>::stats()));
                )+
                actions
            }
        }

        impl AppState {
            /// Per-domain overview, in declaration order
            #[must_use]
            pub fn summaries(&self) -> Vec<SliceSummary> {
                vec![
                    $(SliceSummary {
                        domain: <$resource as $crate::slice::Resource>::DOMAIN,
                        items: self.$field.len(),
                        loading: self.$field.loading() || self.$field.stats_loading(),
                        has_stats: self.$field.stats.is_some(),
                        error: self.$field.error.clone(),
                        stats_error: self.$field.stats_error.clone(),
                    },)+
                ]
            }
        }

        /// Lenses and extractors handed to `scope_reducer`
        mod lens {
            $(
                pub(super) mod $field {
                    use super::super::*;

                    pub(in crate::app) fn state(app: &mut AppState) -> &mut SliceState<$resource> {
                        &mut app.$field
                    }

                    #[allow(clippy::needless_pass_by_value)]
                    pub(in crate::app) fn action(action: AppAction) -> Option<CrudAction<$resource>> {
                        match action {
                            AppAction::$variant(action) => Some(action),
                            #[allow(unreachable_patterns)]
                            _ => None,
                        }
                    }
                }
            )+
        }

        /// Build the root reducer
        #[must_use]
        pub fn app_reducer() -> AppReducer {
            let slices: Vec<BoxedReducer<AppState, AppAction, SliceEnvironment>> = vec![
                $(Box::new(scope_reducer(
                    CrudReducer::<$resource>::new(),
                    lens::$field::state,
                    lens::$field::action,
                    AppAction::$variant,
                )),)+
            ];
            combine_reducers(slices)
        }
    };
}

app_slices! {
    customers: Customers => Customers,
    vehicles: Vehicles => Vehicles,
    catalog: Catalog => ServiceCatalog,
    work_orders: WorkOrders => WorkOrders,
    technicians: Technicians => Technicians,
    invoices: Invoices => Invoices,
    appointments: Appointments => Appointments,
    tasks: Tasks => Tasks,
    memberships: Memberships => MembershipPlans,
    campaigns: Campaigns => Campaigns,
}

/// One line of the dashboard overview
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceSummary {
    /// Domain name
    pub domain: &'static str,
    /// Items currently held
    pub items: usize,
    /// Any request outstanding
    pub loading: bool,
    /// Stats have been fetched
    pub has_stats: bool,
    /// Last items error, or empty
    pub error: String,
    /// Last stats error, or empty
    pub stats_error: String,
}

impl AppState {
    /// Collections the reports are computed from
    #[must_use]
    pub fn report_inputs(&self) -> ReportInputs<'_> {
        ReportInputs {
            invoices: &self.invoices,
            appointments: &self.appointments,
            work_orders: &self.work_orders,
            customers: &self.customers,
        }
    }
}

/// Create the application store with empty slices
#[must_use]
pub fn build_store(env: SliceEnvironment, config: StoreConfig) -> AppStore {
    Store::with_config(AppState::default(), app_reducer(), env, config)
}

/// How a [`refresh_all`] round went
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Requests that settled as rejected
    pub rejected: usize,
    /// Refresh tasks that panicked before their request settled
    pub failed: usize,
}

impl RefreshSummary {
    /// Whether every request settled successfully
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.rejected == 0 && self.failed == 0
    }

    fn record(&mut self, joined: Result<Result<bool, StoreError>, JoinError>) -> Result<(), StoreError> {
        match joined {
            Ok(Ok(true)) => self.rejected += 1,
            Ok(Ok(false)) => {},
            Ok(Err(error)) => return Err(error),
            Err(error) => {
                tracing::error!(%error, "Refresh task failed");
                self.failed += 1;
            },
        }
        Ok(())
    }
}

/// Send every domain's list and stats requests and wait until all have settled
///
/// Requests run concurrently. A refresh task that panics is logged and
/// counted in [`RefreshSummary::failed`]; the others still complete.
///
/// # Errors
///
/// Returns the first [`StoreError`] hit while sending or waiting, e.g.
/// [`StoreError::Timeout`] when a request does not settle within `timeout`.
pub async fn refresh_all(store: &AppStore, timeout: Duration) -> Result<RefreshSummary, StoreError> {
    let mut tasks = JoinSet::new();

    for action in AppAction::refresh_all() {
        let store = store.clone();
        tasks.spawn(async move {
            let Some(request_id) = action.request_id().cloned() else {
                return Ok(false);
            };
            let settled = store
                .send_and_wait_for(action, move |a| a.settles(&request_id), timeout)
                .await?;
            Ok::<_, StoreError>(settled.is_rejection())
        });
    }

    let mut summary = RefreshSummary::default();
    while let Some(joined) = tasks.join_next().await {
        summary.record(joined)?;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    async fn explode() -> Result<bool, StoreError> {
        panic!("refresh task blew up")
    }

    #[tokio::test]
    async fn panicked_refresh_task_is_counted_not_fatal() {
        let mut tasks = JoinSet::new();
        tasks.spawn(async { Ok::<_, StoreError>(true) });
        tasks.spawn(async { Ok::<_, StoreError>(false) });
        tasks.spawn(explode());

        let mut summary = RefreshSummary::default();
        while let Some(joined) = tasks.join_next().await {
            summary.record(joined).unwrap();
        }

        assert_eq!(summary, RefreshSummary { rejected: 1, failed: 1 });
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn store_errors_still_abort_the_refresh() {
        let mut summary = RefreshSummary::default();
        let mut tasks = JoinSet::new();
        tasks.spawn(async { Err::<bool, _>(StoreError::Timeout) });

        let joined = tasks.join_next().await.unwrap();
        assert!(matches!(summary.record(joined), Err(StoreError::Timeout)));
        assert!(summary.is_clean());
    }
}
