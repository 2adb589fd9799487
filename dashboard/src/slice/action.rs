//! Actions of a CRUD slice
//!
//! Each request variant is the "pending" step of one async operation: the
//! reducer records it and returns the effect that performs the call. The
//! effect answers with exactly one [`CrudAction::Fulfilled`] or
//! [`CrudAction::Rejected`] carrying the same [`RequestId`].

use super::entity::{EntityId, RequestId};
use super::resource::Resource;
use shopdesk_api::Page;
use std::fmt;

/// The operation a request performs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch the list
    List,
    /// Fetch one record by id
    Get,
    /// Fetch the aggregate
    Stats,
    /// Create a record
    Create,
    /// Update a record
    Update,
    /// Delete a record
    Delete,
}

impl Operation {
    /// Metric/log label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Stats => "stats",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Create, update and delete announce their outcome to the user
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }

    /// Whether this operation belongs to the stats sub-resource
    #[must_use]
    pub const fn is_stats(self) -> bool {
        matches!(self, Self::Stats)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload of a fulfilled request
#[derive(Clone, Debug)]
pub enum Fulfilled<R: Resource> {
    /// List response
    List(Page<R::Entity>),
    /// Single record
    Get(R::Entity),
    /// Aggregate
    Stats(R::Stats),
    /// The record as created by the backend
    Created(R::Entity),
    /// The record as updated by the backend
    Updated(R::Entity),
    /// Delete confirmation
    Deleted {
        /// Id of the removed record
        id: EntityId,
        /// Confirmation message from the backend
        message: String,
    },
}

impl<R: Resource> Fulfilled<R> {
    /// The operation this payload answers
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::List(_) => Operation::List,
            Self::Get(_) => Operation::Get,
            Self::Stats(_) => Operation::Stats,
            Self::Created(_) => Operation::Create,
            Self::Updated(_) => Operation::Update,
            Self::Deleted { .. } => Operation::Delete,
        }
    }
}

/// All inputs to a CRUD slice
#[derive(Clone, Debug)]
pub enum CrudAction<R: Resource> {
    /// Fetch the list matching `filter`
    List {
        /// Request id
        request_id: RequestId,
        /// Query filter
        filter: R::Filter,
    },
    /// Fetch one record
    Get {
        /// Request id
        request_id: RequestId,
        /// Record id
        id: EntityId,
    },
    /// Fetch the aggregate
    Stats {
        /// Request id
        request_id: RequestId,
    },
    /// Create a record
    Create {
        /// Request id
        request_id: RequestId,
        /// Create payload
        draft: R::Draft,
    },
    /// Update a record
    Update {
        /// Request id
        request_id: RequestId,
        /// Record id
        id: EntityId,
        /// Partial payload
        patch: R::Patch,
    },
    /// Delete a record
    Delete {
        /// Request id
        request_id: RequestId,
        /// Record id
        id: EntityId,
    },

    /// Abort an in-flight request; its completion will be ignored
    Cancel {
        /// Request to abort
        request_id: RequestId,
    },
    /// Reset the items error
    ClearError,
    /// Reset the stats error
    ClearStatsError,

    /// A request succeeded
    Fulfilled {
        /// Request id
        request_id: RequestId,
        /// Decoded payload
        payload: Fulfilled<R>,
    },
    /// A request failed
    Rejected {
        /// Request id
        request_id: RequestId,
        /// The operation that failed
        operation: Operation,
        /// Message for the user
        message: String,
    },
}

impl<R: Resource> CrudAction<R> {
    /// List request with a fresh request id
    #[must_use]
    pub fn list(filter: R::Filter) -> Self {
        Self::List {
            request_id: RequestId::new(),
            filter,
        }
    }

    /// List request without filters
    #[must_use]
    pub fn list_all() -> Self {
        Self::list(R::Filter::default())
    }

    /// Get request with a fresh request id
    #[must_use]
    pub fn get(id: impl Into<EntityId>) -> Self {
        Self::Get {
            request_id: RequestId::new(),
            id: id.into(),
        }
    }

    /// Stats request with a fresh request id
    #[must_use]
    pub fn stats() -> Self {
        Self::Stats {
            request_id: RequestId::new(),
        }
    }

    /// Create request with a fresh request id
    #[must_use]
    pub fn create(draft: R::Draft) -> Self {
        Self::Create {
            request_id: RequestId::new(),
            draft,
        }
    }

    /// Update request with a fresh request id
    #[must_use]
    pub fn update(id: impl Into<EntityId>, patch: R::Patch) -> Self {
        Self::Update {
            request_id: RequestId::new(),
            id: id.into(),
            patch,
        }
    }

    /// Delete request with a fresh request id
    #[must_use]
    pub fn delete(id: impl Into<EntityId>) -> Self {
        Self::Delete {
            request_id: RequestId::new(),
            id: id.into(),
        }
    }

    /// The request this action starts, settles or cancels
    #[must_use]
    pub const fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::List { request_id, .. }
            | Self::Get { request_id, .. }
            | Self::Stats { request_id }
            | Self::Create { request_id, .. }
            | Self::Update { request_id, .. }
            | Self::Delete { request_id, .. }
            | Self::Cancel { request_id }
            | Self::Fulfilled { request_id, .. }
            | Self::Rejected { request_id, .. } => Some(request_id),
            Self::ClearError | Self::ClearStatsError => None,
        }
    }

    /// The operation a request variant starts
    #[must_use]
    pub const fn operation(&self) -> Option<Operation> {
        match self {
            Self::List { .. } => Some(Operation::List),
            Self::Get { .. } => Some(Operation::Get),
            Self::Stats { .. } => Some(Operation::Stats),
            Self::Create { .. } => Some(Operation::Create),
            Self::Update { .. } => Some(Operation::Update),
            Self::Delete { .. } => Some(Operation::Delete),
            _ => None,
        }
    }

    /// True for `Fulfilled` and `Rejected`
    #[must_use]
    pub const fn is_settlement(&self) -> bool {
        matches!(self, Self::Fulfilled { .. } | Self::Rejected { .. })
    }

    /// True for `Rejected`
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// True when this action settles `request_id`
    #[must_use]
    pub fn settles(&self, request_id: &RequestId) -> bool {
        self.is_settlement() && self.request_id() == Some(request_id)
    }
}
