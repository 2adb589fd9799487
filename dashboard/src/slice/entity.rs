//! Identity types shared by every slice

use serde::{Deserialize, Serialize};
use shopdesk_core::effect::EffectId;
use std::fmt;
use uuid::Uuid;

/// Backend-assigned entity identifier
///
/// Opaque to the client: only ever read from responses, never generated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an id received from the backend
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Serde adapter for a record's own id
///
/// Backends send the id as `id`, as `_id`, or as both when virtuals are
/// serialized next to the raw key. Use it on a flattened field:
/// `#[serde(flatten, with = "record_id")]`. `id` wins over `_id`; both keys
/// are consumed so neither leaks into a flattened catch-all map. Serializes
/// as `id`.
pub mod record_id {
    use super::EntityId;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    struct Keys {
        id: Option<EntityId>,
        #[serde(rename = "_id")]
        raw_id: Option<EntityId>,
    }

    #[derive(Serialize)]
    struct Key<'a> {
        id: &'a EntityId,
    }

    /// Write the id under `id`
    ///
    /// # Errors
    ///
    /// Whatever the serializer reports.
    pub fn serialize<S: Serializer>(id: &EntityId, serializer: S) -> Result<S::Ok, S::Error> {
        Key { id }.serialize(serializer)
    }

    /// Read `id`, falling back to `_id`
    ///
    /// # Errors
    ///
    /// A missing-field error when neither key is present.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EntityId, D::Error> {
        let keys = Keys::deserialize(deserializer)?;
        keys.id.or(keys.raw_id).ok_or_else(|| D::Error::missing_field("id"))
    }
}

/// A record mirrored from the backend
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
    /// The backend-assigned id
    fn id(&self) -> &EntityId;
}

/// Client-generated identifier of one in-flight request
///
/// Distinct from [`EntityId`]: it names a dispatch, not a record, and doubles
/// as the cancellation id of the request's effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generate a fresh request id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Cancellation id of the effect running this request
    #[must_use]
    pub fn effect_id(&self) -> EffectId {
        EffectId::new(self.0.to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert_ne!(a.effect_id(), b.effect_id());
        assert_eq!(a.effect_id().as_str(), a.to_string());
    }

    #[derive(Debug, Deserialize, Serialize)]
    struct Record {
        #[serde(flatten, with = "record_id")]
        id: EntityId,
        #[serde(flatten)]
        extra: serde_json::Map<String, serde_json::Value>,
    }

    #[test]
    fn record_id_accepts_either_key_and_prefers_id() {
        let both: Record = serde_json::from_value(serde_json::json!({ "_id": "raw", "id": "virtual", "n": 1 })).unwrap();
        assert_eq!(both.id, EntityId::from("virtual"));
        assert_eq!(both.extra.keys().collect::<Vec<_>>(), vec!["n"]);

        let raw: Record = serde_json::from_value(serde_json::json!({ "_id": "raw" })).unwrap();
        assert_eq!(raw.id, EntityId::from("raw"));

        let missing = serde_json::from_value::<Record>(serde_json::json!({ "n": 1 })).unwrap_err();
        assert!(missing.to_string().contains("missing field `id`"));
    }

    #[test]
    fn record_id_serializes_as_id() {
        let record = Record {
            id: EntityId::from("c-1"),
            extra: serde_json::Map::new(),
        };
        assert_eq!(serde_json::to_value(&record).unwrap(), serde_json::json!({ "id": "c-1" }));
    }

    #[test]
    fn entity_id_is_transparent_in_json() {
        let id: EntityId = serde_json::from_str("\"wo-42\"").unwrap();
        assert_eq!(id, EntityId::from("wo-42"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"wo-42\"");
    }
}
