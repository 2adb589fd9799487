//! The generic CRUD slice reducer

use super::action::{CrudAction, Fulfilled, Operation};
use super::entity::Entity;
use super::resource::Resource;
use super::state::CollectionState;
use super::{thunk, SliceEnvironment};
use shopdesk_core::environment::Notification;
use shopdesk_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::marker::PhantomData;

/// State of the slice for resource `R`
pub type SliceState<R> = CollectionState<<R as Resource>::Entity, <R as Resource>::Stats>;

/// Reducer for one resource's slice
///
/// - Request: record it as in flight (raising the matching loading flag),
///   clear the matching error, return the request effect
/// - Fulfilled: apply the payload to exactly one sub-resource
/// - Rejected: overwrite the matching error
/// - Cancel: drop the request and abort its effect
///
/// Settlements for requests that are not in flight (already settled or
/// cancelled) are ignored.
pub struct CrudReducer<R>(PhantomData<fn() -> R>);

impl<R> CrudReducer<R> {
    /// Creates a new `CrudReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for CrudReducer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for CrudReducer<R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<R: Resource> CrudReducer<R> {
    fn apply(state: &mut SliceState<R>, payload: Fulfilled<R>) {
        match payload {
            Fulfilled::List(page) => {
                state.replace_items(page.items);
                state.pagination = page.pagination;
            },
            Fulfilled::Get(entity) => state.selected = Some(entity),
            Fulfilled::Stats(stats) => state.stats = Some(stats),
            Fulfilled::Created(entity) => state.append(entity),
            Fulfilled::Updated(entity) => {
                let id = entity.id().clone();
                if !state.replace_by_id(entity) {
                    tracing::debug!(domain = R::DOMAIN, %id, "Update for an id not in the collection; ignored");
                }
            },
            Fulfilled::Deleted { id, .. } => {
                state.remove_by_id(&id);
            },
        }
    }
}

impl<R: Resource> Reducer for CrudReducer<R> {
    type State = SliceState<R>;
    type Action = CrudAction<R>;
    type Environment = SliceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Requests (pending) ==========
            CrudAction::List { request_id, filter } => {
                state.begin(request_id.clone(), Operation::List);
                state.error.clear();
                smallvec![thunk::list(env, request_id, filter)]
            },

            CrudAction::Get { request_id, id } => {
                state.begin(request_id.clone(), Operation::Get);
                state.error.clear();
                smallvec![thunk::get(env, request_id, id)]
            },

            CrudAction::Stats { request_id } => {
                state.begin(request_id.clone(), Operation::Stats);
                state.stats_error.clear();
                smallvec![thunk::stats(env, request_id)]
            },

            CrudAction::Create { request_id, draft } => {
                if let Err(message) = R::validate_draft(&draft) {
                    tracing::debug!(domain = R::DOMAIN, %message, "Draft rejected before request");
                    state.error.clone_from(&message);
                    return smallvec![thunk::notify(env, Notification::error(message))];
                }

                state.begin(request_id.clone(), Operation::Create);
                state.error.clear();
                smallvec![thunk::create(env, request_id, draft)]
            },

            CrudAction::Update {
                request_id,
                id,
                patch,
            } => {
                state.begin(request_id.clone(), Operation::Update);
                state.error.clear();
                smallvec![thunk::update(env, request_id, id, patch)]
            },

            CrudAction::Delete { request_id, id } => {
                state.begin(request_id.clone(), Operation::Delete);
                state.error.clear();
                smallvec![thunk::delete(env, request_id, id)]
            },

            // ========== Control ==========
            CrudAction::Cancel { request_id } => match state.settle(&request_id) {
                Some(operation) => {
                    tracing::debug!(domain = R::DOMAIN, %request_id, %operation, "Request cancelled");
                    smallvec![Effect::Cancel(request_id.effect_id())]
                },
                None => SmallVec::new(),
            },

            CrudAction::ClearError => {
                state.error.clear();
                SmallVec::new()
            },

            CrudAction::ClearStatsError => {
                state.stats_error.clear();
                SmallVec::new()
            },

            // ========== Settlements ==========
            CrudAction::Fulfilled {
                request_id,
                payload,
            } => {
                if state.settle(&request_id).is_none() {
                    tracing::debug!(domain = R::DOMAIN, %request_id, "Discarding stale completion");
                    return SmallVec::new();
                }
                Self::apply(state, payload);
                SmallVec::new()
            },

            CrudAction::Rejected {
                request_id,
                operation,
                message,
            } => {
                let Some(started) = state.settle(&request_id) else {
                    tracing::debug!(domain = R::DOMAIN, %request_id, "Discarding stale rejection");
                    return SmallVec::new();
                };
                if started != operation {
                    tracing::warn!(
                        domain = R::DOMAIN,
                        %request_id,
                        %started,
                        reported = %operation,
                        "Rejection reports a different operation than the request started"
                    );
                }
                if started.is_stats() {
                    state.stats_error = message;
                } else {
                    state.error = message;
                }
                SmallVec::new()
            },
        }
    }
}
