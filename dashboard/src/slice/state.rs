//! Client-local mirror of one backend collection

use super::action::Operation;
use super::entity::{Entity, EntityId, RequestId};
use shopdesk_api::Pagination;
use std::collections::{BTreeMap, HashSet};

/// State of one domain slice
///
/// `items` keeps server order; creates append. No two items share an id.
/// The loading flags are derived from the table of requests still in
/// flight, so they return to `false` on every settlement path (fulfilled,
/// rejected or cancelled).
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionState<E, S> {
    /// Records in server order
    pub items: Vec<E>,
    /// Last record fetched by id
    pub selected: Option<E>,
    /// Pagination metadata from the last list response
    pub pagination: Option<Pagination>,
    /// Server-computed aggregate, fetched independently of `items`
    pub stats: Option<S>,
    /// Last error for the items sub-resource; empty when none
    pub error: String,
    /// Last error for the stats sub-resource; empty when none
    pub stats_error: String,
    /// Bumped whenever `items` changes
    pub revision: u64,
    in_flight: BTreeMap<RequestId, Operation>,
}

impl<E, S> Default for CollectionState<E, S> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            pagination: None,
            stats: None,
            error: String::new(),
            stats_error: String::new(),
            revision: 0,
            in_flight: BTreeMap::new(),
        }
    }
}

impl<E: Entity, S> CollectionState<E, S> {
    /// Empty collection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty stats, holding `items` as if a list had just been fetched
    #[must_use]
    pub fn with_items(items: Vec<E>) -> Self {
        let mut state = Self::default();
        state.replace_items(items);
        state
    }

    /// True while any request for the items sub-resource is outstanding
    #[must_use]
    pub fn loading(&self) -> bool {
        self.in_flight.values().any(|op| !op.is_stats())
    }

    /// True while a stats request is outstanding
    #[must_use]
    pub fn stats_loading(&self) -> bool {
        self.in_flight.values().any(|op| op.is_stats())
    }

    /// Whether `request_id` has been dispatched and not yet settled
    #[must_use]
    pub fn is_in_flight(&self, request_id: &RequestId) -> bool {
        self.in_flight.contains_key(request_id)
    }

    /// Number of outstanding requests
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Look up a record by id
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&E> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether a record with `id` is present
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no records are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn begin(&mut self, request_id: RequestId, operation: Operation) {
        self.in_flight.insert(request_id, operation);
    }

    /// Remove a request from the in-flight table, returning what it was
    ///
    /// `None` means the request already settled (or was cancelled) and any
    /// completion for it is stale.
    pub(crate) fn settle(&mut self, request_id: &RequestId) -> Option<Operation> {
        self.in_flight.remove(request_id)
    }

    /// Replace `items` wholesale
    ///
    /// A payload repeating an id keeps only the first occurrence.
    pub(crate) fn replace_items(&mut self, items: Vec<E>) {
        let mut seen = HashSet::with_capacity(items.len());
        let before = items.len();
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.id().clone()))
            .collect();
        if self.items.len() != before {
            tracing::warn!(
                dropped = before - self.items.len(),
                "List payload repeated entity ids"
            );
        }
        self.touch();
    }

    /// Append a created record
    ///
    /// A record whose id is already present replaces the existing entry instead.
    pub(crate) fn append(&mut self, item: E) {
        if !self.replace_by_id(item.clone()) {
            self.items.push(item);
            self.touch();
        }
    }

    /// Replace the record with the same id in place; `false` if absent
    pub(crate) fn replace_by_id(&mut self, item: E) -> bool {
        if let Some(selected) = self.selected.as_mut().filter(|s| s.id() == item.id()) {
            *selected = item.clone();
        }

        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                *existing = item;
                self.touch();
                true
            },
            None => false,
        }
    }

    /// Remove the record with `id`; `false` if absent
    pub(crate) fn remove_by_id(&mut self, id: &EntityId) -> bool {
        if self.selected.as_ref().is_some_and(|s| s.id() == id) {
            self.selected = None;
        }

        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        let removed = self.items.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    const fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: EntityId,
        name: &'static str,
    }

    impl Entity for Row {
        fn id(&self) -> &EntityId {
            &self.id
        }
    }

    fn row(id: &str, name: &'static str) -> Row {
        Row { id: EntityId::from(id), name }
    }

    type State = CollectionState<Row, ()>;

    #[test]
    fn loading_flags_follow_in_flight_table() {
        let mut state = State::new();
        assert!(!state.loading());
        assert!(!state.stats_loading());

        let list = RequestId::new();
        let stats = RequestId::new();
        state.begin(list.clone(), Operation::List);
        state.begin(stats.clone(), Operation::Stats);
        assert!(state.loading());
        assert!(state.stats_loading());

        assert_eq!(state.settle(&list), Some(Operation::List));
        assert!(!state.loading());
        assert!(state.stats_loading());

        assert_eq!(state.settle(&list), None);
        assert_eq!(state.settle(&stats), Some(Operation::Stats));
        assert_eq!(state.in_flight_count(), 0);
    }

    #[test]
    fn replace_items_drops_repeated_ids() {
        let state = State::with_items(vec![row("a", "first"), row("b", "b"), row("a", "second")]);
        assert_eq!(state.items, vec![row("a", "first"), row("b", "b")]);
        assert_eq!(state.revision, 1);
    }

    #[test]
    fn append_existing_id_replaces() {
        let mut state = State::with_items(vec![row("a", "old")]);
        state.append(row("a", "new"));
        assert_eq!(state.items, vec![row("a", "new")]);
    }

    #[test]
    fn replace_missing_id_changes_nothing() {
        let mut state = State::with_items(vec![row("a", "a")]);
        let revision = state.revision;
        assert!(!state.replace_by_id(row("z", "z")));
        assert_eq!(state.items, vec![row("a", "a")]);
        assert_eq!(state.revision, revision);
    }

    #[test]
    fn remove_clears_matching_selection() {
        let mut state = State::with_items(vec![row("a", "a"), row("b", "b")]);
        state.selected = Some(row("b", "b"));
        assert!(state.remove_by_id(&EntityId::from("b")));
        assert!(state.selected.is_none());
        assert!(!state.remove_by_id(&EntityId::from("b")));
        assert_eq!(state.len(), 1);
    }
}
