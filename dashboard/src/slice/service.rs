//! One HTTP call per backend endpoint of a resource
//!
//! No business logic, no retries, no caching: each method issues exactly one
//! request through the [`Transport`] and decodes the envelope into typed
//! values. Errors propagate unchanged.

use super::entity::EntityId;
use super::resource::Resource;
use serde::Serialize;
use serde_json::Value;
use shopdesk_api::{
    decode_confirmation, decode_data, decode_page, ApiError, ApiRequest, Page, Query, Transport,
};
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed client for one resource's endpoints
pub struct ResourceService<R> {
    transport: Arc<dyn Transport>,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for ResourceService<R> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> ResourceService<R> {
    /// Service issuing requests through `transport`
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            _resource: PhantomData,
        }
    }

    /// `GET /{path}` with `filter` as the query string
    ///
    /// # Errors
    ///
    /// Transport errors, or [`ApiError::Decode`] for an unexpected body.
    pub async fn list(&self, filter: &R::Filter) -> Result<Page<R::Entity>, ApiError> {
        let query = Query::from_filter(filter)?;
        let body = self
            .transport
            .execute(ApiRequest::get(R::PATH).with_query(query))
            .await?;
        decode_page(body, R::COLLECTION_KEY)
    }

    /// `GET /{path}/{id}`
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidRequest`] for an empty or dot-segment id, transport
    /// errors, or [`ApiError::Decode`] for an unexpected body.
    pub async fn get(&self, id: &EntityId) -> Result<R::Entity, ApiError> {
        let body = self.transport.execute(ApiRequest::get(item_path::<R>(id)?)).await?;
        decode_data(body)
    }

    /// `POST /{path}`
    ///
    /// # Errors
    ///
    /// Transport errors, or [`ApiError::Decode`] for an unexpected body.
    pub async fn create(&self, draft: &R::Draft) -> Result<R::Entity, ApiError> {
        let body = self
            .transport
            .execute(ApiRequest::post(R::PATH, to_body(draft)?))
            .await?;
        decode_data(body)
    }

    /// `PUT /{path}/{id}` with a partial payload
    ///
    /// # Errors
    ///
    /// Transport errors, or [`ApiError::Decode`] for an unexpected body.
    pub async fn update(&self, id: &EntityId, patch: &R::Patch) -> Result<R::Entity, ApiError> {
        let body = self
            .transport
            .execute(ApiRequest::put(item_path::<R>(id)?, to_body(patch)?))
            .await?;
        decode_data(body)
    }

    /// `DELETE /{path}/{id}`, returning the confirmation message
    ///
    /// # Errors
    ///
    /// Transport errors, or [`ApiError::Rejected`] for `success: false`.
    pub async fn delete(&self, id: &EntityId) -> Result<String, ApiError> {
        let body = self
            .transport
            .execute(ApiRequest::delete(item_path::<R>(id)?))
            .await?;
        decode_confirmation(body, &format!("{} deleted", R::LABEL))
    }

    /// `GET /{path}/{stats_path}`
    ///
    /// # Errors
    ///
    /// Transport errors, or [`ApiError::Decode`] for an unexpected body.
    pub async fn stats(&self) -> Result<R::Stats, ApiError> {
        let path = format!("{}/{}", R::PATH, R::STATS_PATH);
        let body = self.transport.execute(ApiRequest::get(path)).await?;
        decode_data(body)
    }
}

/// `{path}/{id}` with the id encoded as exactly one path segment
///
/// Everything outside the unreserved set is percent-encoded, so `/`, `?` and
/// `#` cannot leave the segment. `.` and `..` are refused: URL parsers
/// resolve them as dot segments even when encoded.
fn item_path<R: Resource>(id: &EntityId) -> Result<String, ApiError> {
    match id.as_str() {
        "" | "." | ".." => Err(ApiError::InvalidRequest(format!("Invalid {} id '{id}'", R::LABEL))),
        raw => Ok(format!("{}/{}", R::PATH, urlencoding::encode(raw))),
    }
}

fn to_body<T: Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}
