//! The per-domain description a CRUD slice is instantiated with

use super::action::Operation;
use super::entity::Entity;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Stats path used by every domain unless it overrides [`Resource::STATS_PATH`]
pub const DEFAULT_STATS_PATH: &str = "stats/overview";

/// One backend collection: its endpoints, payload types and user-facing messages
///
/// Implemented on a zero-sized marker type per domain; the generic slice
/// machinery ([`CrudReducer`](super::CrudReducer),
/// [`ResourceService`](super::ResourceService)) is instantiated once per
/// implementation.
pub trait Resource: Clone + Copy + Debug + Default + Send + Sync + 'static {
    /// Record type held in the collection
    type Entity: Entity + DeserializeOwned + PartialEq;
    /// Create payload
    type Draft: Serialize + Clone + Debug + Send + Sync + 'static;
    /// Partial update payload
    type Patch: Serialize + Clone + Debug + Send + Sync + 'static;
    /// List filter; `None` fields are left out of the query string
    type Filter: Serialize + Clone + Debug + Default + Send + Sync + 'static;
    /// Server-computed aggregate for the collection
    type Stats: DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Short name used in logs and metric labels
    const DOMAIN: &'static str;
    /// Collection path relative to the API base URL
    const PATH: &'static str;
    /// Aggregate path relative to [`Resource::PATH`]
    const STATS_PATH: &'static str = DEFAULT_STATS_PATH;
    /// Key of the list inside a `{ data: { <key>: [..] } }` envelope
    const COLLECTION_KEY: &'static str;
    /// Singular name used in notifications ("Customer", "Service", ...)
    const LABEL: &'static str;

    /// Check a create payload before any request is made
    ///
    /// # Errors
    ///
    /// Returns the message to show the user when the draft is incomplete.
    fn validate_draft(_draft: &Self::Draft) -> Result<(), String> {
        Ok(())
    }

    /// Static message announced when a mutation succeeds
    ///
    /// `None` for read operations, which never notify.
    #[must_use]
    fn success_message(operation: Operation) -> Option<String> {
        let verb = match operation {
            Operation::Create => "created",
            Operation::Update => "updated",
            Operation::Delete => "deleted",
            Operation::List | Operation::Get | Operation::Stats => return None,
        };
        Some(format!("{} {verb} successfully", Self::LABEL))
    }
}

/// Require a non-blank string field
///
/// # Errors
///
/// Returns `"<label> is required"` when `value` is empty or whitespace.
pub fn require(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{label} is required"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank() {
        assert_eq!(require("  ", "Name"), Err("Name is required".to_string()));
        assert_eq!(require("Oil Change", "Name"), Ok(()));
    }
}
