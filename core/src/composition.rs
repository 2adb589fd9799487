//! Reducer composition
//!
//! The root reducer of an application is assembled from per-slice reducers:
//! [`scope_reducer`] lifts a slice reducer into the root state and action
//! types, and [`combine_reducers`] runs the lifted reducers one after another
//! for every root action.

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;
use std::marker::PhantomData;

/// A type-erased reducer over `S`, `A` and `E`
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Run several reducers over the same state and action types.
///
/// Reducers see the action in the order given; their effects are
/// concatenated in that order.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: impl IntoIterator<Item = BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer {
        reducers: reducers.into_iter().collect(),
    }
}

/// Reducer built by [`combine_reducers`]
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E> {
    /// Number of reducers combined
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether no reducer was combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some((last, rest)) = self.reducers.split_last() else {
            return SmallVec::new();
        };

        let mut effects = SmallVec::new();
        for reducer in rest {
            effects.extend(reducer.reduce(state, action.clone(), env));
        }
        effects.extend(last.reduce(state, action, env));
        effects
    }
}

/// Lift a slice reducer into a parent state and action.
///
/// - `lens`: the slice inside the parent state
/// - `extract`: the slice action, or `None` when the parent action targets another slice
/// - `embed`: wraps actions produced by the slice's effects back into the parent type
///
/// A parent action that `extract` rejects leaves the state untouched and
/// yields no effects.
pub fn scope_reducer<S, SubS, A, SubA, E, R>(
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
) -> ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    ScopedReducer {
        reducer,
        lens,
        extract,
        embed,
        _env: PhantomData,
    }
}

/// Reducer built by [`scope_reducer`]
pub struct ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    _env: PhantomData<fn(&E)>,
}

impl<S, SubS, A, SubA, E, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
    A: Send + 'static,
    SubA: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(slice_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let embed = self.embed;
        self.reducer
            .reduce((self.lens)(state), slice_action, env)
            .into_iter()
            .map(|effect| effect.map(embed))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smallvec;

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Slice {
        names: Vec<String>,
        loading: bool,
    }

    #[derive(Clone, Debug)]
    enum SliceAction {
        Fetch,
        Fetched(Vec<String>),
    }

    struct SliceReducer;

    impl Reducer for SliceReducer {
        type State = Slice;
        type Action = SliceAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SliceAction::Fetch => {
                    state.loading = true;
                    smallvec![Effect::future(async {
                        Some(SliceAction::Fetched(vec!["Oil Change".to_string()]))
                    })]
                },
                SliceAction::Fetched(names) => {
                    state.loading = false;
                    state.names = names;
                    SmallVec::new()
                },
            }
        }
    }

    #[derive(Clone, Debug, Default)]
    struct Root {
        customers: Slice,
        services: Slice,
    }

    #[derive(Clone, Debug)]
    enum RootAction {
        Customers(SliceAction),
        Services(SliceAction),
    }

    fn customers_slice(root: &mut Root) -> &mut Slice {
        &mut root.customers
    }

    fn services_slice(root: &mut Root) -> &mut Slice {
        &mut root.services
    }

    fn customers_action(action: RootAction) -> Option<SliceAction> {
        match action {
            RootAction::Customers(a) => Some(a),
            RootAction::Services(_) => None,
        }
    }

    fn services_action(action: RootAction) -> Option<SliceAction> {
        match action {
            RootAction::Services(a) => Some(a),
            RootAction::Customers(_) => None,
        }
    }

    fn customers() -> BoxedReducer<Root, RootAction, ()> {
        Box::new(scope_reducer(SliceReducer, customers_slice, customers_action, RootAction::Customers))
    }

    fn services() -> BoxedReducer<Root, RootAction, ()> {
        Box::new(scope_reducer(SliceReducer, services_slice, services_action, RootAction::Services))
    }

    #[test]
    fn test_action_reaches_only_its_slice() {
        let root = combine_reducers([customers(), services()]);
        let mut state = Root::default();

        let effects = root.reduce(&mut state, RootAction::Services(SliceAction::Fetch), &());

        assert_eq!(effects.len(), 1);
        assert!(state.services.loading);
        assert_eq!(state.customers, Slice::default());
    }

    #[test]
    fn test_empty_combination_is_inert() {
        let root = combine_reducers(Vec::<BoxedReducer<Root, RootAction, ()>>::new());
        let mut state = Root::default();

        assert!(root.is_empty());
        assert!(root
            .reduce(&mut state, RootAction::Customers(SliceAction::Fetch), &())
            .is_empty());
        assert!(!state.customers.loading);
    }

    #[tokio::test]
    async fn test_slice_effects_are_embedded() {
        let root = combine_reducers([customers(), services()]);
        assert_eq!(root.len(), 2);
        let mut state = Root::default();

        let mut effects = root
            .reduce(&mut state, RootAction::Customers(SliceAction::Fetch), &())
            .into_iter();
        let Some(Effect::Future(fut)) = effects.next() else {
            unreachable!("fetch produces a future effect");
        };
        let Some(fed_back) = fut.await else {
            unreachable!("fetch resolves to an action");
        };
        assert!(matches!(fed_back, RootAction::Customers(SliceAction::Fetched(_))));

        let _ = root.reduce(&mut state, fed_back, &());
        assert_eq!(state.customers.names, vec!["Oil Change".to_string()]);
        assert!(!state.customers.loading);
    }
}
