//! Request effects
//!
//! Each request action becomes one cancellable [`Effect::Future`] that calls
//! the service and always resolves to a `Fulfilled` or `Rejected` action;
//! errors never escape. Mutations announce their outcome with exactly one
//! notification, reads fail silently into state.

use super::action::{CrudAction, Fulfilled, Operation};
use super::entity::{EntityId, RequestId};
use super::resource::Resource;
use super::service::ResourceService;
use super::SliceEnvironment;
use shopdesk_api::ApiError;
use shopdesk_core::effect::Effect;
use shopdesk_core::environment::{Notification, Notifier};
use shopdesk_runtime::metrics::RequestMetrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Effect fetching the list
pub fn list<R: Resource>(
    env: &SliceEnvironment,
    request_id: RequestId,
    filter: R::Filter,
) -> Effect<CrudAction<R>> {
    let service = env.service::<R>();
    request(env, request_id, Operation::List, async move {
        service.list(&filter).await.map(Fulfilled::List)
    })
}

/// Effect fetching one record
pub fn get<R: Resource>(env: &SliceEnvironment, request_id: RequestId, id: EntityId) -> Effect<CrudAction<R>> {
    let service = env.service::<R>();
    request(env, request_id, Operation::Get, async move {
        service.get(&id).await.map(Fulfilled::Get)
    })
}

/// Effect fetching the aggregate
pub fn stats<R: Resource>(env: &SliceEnvironment, request_id: RequestId) -> Effect<CrudAction<R>> {
    let service = env.service::<R>();
    request(env, request_id, Operation::Stats, async move {
        service.stats().await.map(Fulfilled::Stats)
    })
}

/// Effect creating a record
pub fn create<R: Resource>(
    env: &SliceEnvironment,
    request_id: RequestId,
    draft: R::Draft,
) -> Effect<CrudAction<R>> {
    let service = env.service::<R>();
    request(env, request_id, Operation::Create, async move {
        service.create(&draft).await.map(Fulfilled::Created)
    })
}

/// Effect updating a record
pub fn update<R: Resource>(
    env: &SliceEnvironment,
    request_id: RequestId,
    id: EntityId,
    patch: R::Patch,
) -> Effect<CrudAction<R>> {
    let service = env.service::<R>();
    request(env, request_id, Operation::Update, async move {
        service.update(&id, &patch).await.map(Fulfilled::Updated)
    })
}

/// Effect deleting a record
pub fn delete<R: Resource>(env: &SliceEnvironment, request_id: RequestId, id: EntityId) -> Effect<CrudAction<R>> {
    let service = env.service::<R>();
    request(env, request_id, Operation::Delete, async move {
        let message = service.delete(&id).await?;
        Ok(Fulfilled::Deleted { id, message })
    })
}

/// Effect delivering one notification, producing no action
pub fn notify<R: Resource>(env: &SliceEnvironment, notification: Notification) -> Effect<CrudAction<R>> {
    let notifier = Arc::clone(&env.notifier);
    Effect::future(async move {
        notifier.notify(notification);
        None
    })
}

/// Wrap a service call into the pending → fulfilled | rejected lifecycle
fn request<R, Fut>(
    env: &SliceEnvironment,
    request_id: RequestId,
    operation: Operation,
    call: Fut,
) -> Effect<CrudAction<R>>
where
    R: Resource,
    Fut: Future<Output = Result<Fulfilled<R>, ApiError>> + Send + 'static,
{
    let notifier: Option<Arc<dyn Notifier>> =
        operation.is_mutation().then(|| Arc::clone(&env.notifier));
    let effect_id = request_id.effect_id();
    let span = tracing::debug_span!(
        "request",
        domain = R::DOMAIN,
        operation = operation.as_str(),
        request_id = %request_id,
    );

    Effect::future(
        async move {
            let start = Instant::now();
            let result = call.await;
            RequestMetrics::record(R::DOMAIN, operation.as_str(), start.elapsed(), result.is_ok());

            match result {
                Ok(payload) => {
                    tracing::debug!("Request fulfilled");
                    if let (Some(notifier), Some(message)) = (&notifier, R::success_message(operation)) {
                        notifier.notify(Notification::success(message));
                    }
                    Some(CrudAction::Fulfilled {
                        request_id,
                        payload,
                    })
                },
                Err(error) => {
                    tracing::warn!(%error, "Request rejected");
                    let message = error.user_message();
                    if let Some(notifier) = &notifier {
                        notifier.notify(Notification::error(message.clone()));
                    }
                    Some(CrudAction::Rejected {
                        request_id,
                        operation,
                        message,
                    })
                },
            }
        }
        .instrument(span),
    )
    .cancellable(effect_id)
}
