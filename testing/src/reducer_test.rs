//! Given-When-Then harness for reducers
//!
//! Reducers are pure apart from the effects they return, so a test only has
//! to seed a state, apply actions and look at what came out. Effects are
//! inspected, never executed.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use shopdesk_core::{effect::Effect, reducer::Reducer};

enum Check<S, A> {
    State(Box<dyn FnOnce(&S)>),
    Effects(Box<dyn FnOnce(&[Effect<A>])>),
}

/// What a reducer produced for the action under test
pub struct Outcome<S, A> {
    /// State after every action has been applied
    pub state: S,
    /// Effects returned for the action under test
    pub effects: Vec<Effect<A>>,
}

/// Fluent reducer test
///
/// ```ignore
/// ReducerTest::new(CrudReducer::<Customers>::new())
///     .with_env(env)
///     .given_state(SliceState::new())
///     .given_actions([list_request.clone()])
///     .when_action(list_fulfilled)
///     .then_state(|state| assert!(!state.loading()))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
///
/// Checks run in the order they were added.
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    given: Option<S>,
    history: Vec<A>,
    action: Option<A>,
    checks: Vec<Check<S, A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            given: None,
            history: Vec::new(),
            action: None,
            checks: Vec::new(),
        }
    }

    /// Environment passed to every `reduce` call
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.given = Some(state);
        self
    }

    /// Actions applied before the one under test; their effects are dropped
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.history.extend(actions);
        self
    }

    /// The action under test
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Check the final state
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.checks.push(Check::State(Box::new(check)));
        self
    }

    /// Check the effects returned for the action under test
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.checks.push(Check::Effects(Box::new(check)));
        self
    }

    /// Apply the actions, run every check and hand back the outcome
    ///
    /// # Panics
    ///
    /// Panics when the state, action or environment was never set, or when
    /// a check fails.
    #[allow(clippy::panic)] // Test code can panic
    pub fn run(self) -> Outcome<S, A> {
        let Self {
            reducer,
            environment,
            given,
            history,
            action,
            checks,
        } = self;

        let (Some(env), Some(mut state), Some(action)) = (environment, given, action) else {
            panic!("ReducerTest needs with_env(), given_state() and when_action() before run()");
        };

        for earlier in history {
            drop(reducer.reduce(&mut state, earlier, &env));
        }
        let effects = reducer.reduce(&mut state, action, &env).into_vec();

        for check in checks {
            match check {
                Check::State(check) => check(&state),
                Check::Effects(check) => check(&effects),
            }
        }

        Outcome { state, effects }
    }
}

/// Effect assertions for use inside `then_effects`
///
/// Wrapped effects are searched too: a future inside
/// [`Effect::Cancellable`] counts as a future.
pub mod assertions {
    use shopdesk_core::effect::Effect;

    fn contains<A>(effect: &Effect<A>, pred: &dyn Fn(&Effect<A>) -> bool) -> bool {
        pred(effect) || matches!(effect, Effect::Cancellable { effect, .. } if contains(effect, pred))
    }

    fn any<A>(effects: &[Effect<A>], pred: &dyn Fn(&Effect<A>) -> bool) -> bool {
        effects.iter().any(|effect| contains(effect, pred))
    }

    /// No effects, or only [`Effect::None`]
    ///
    /// # Panics
    ///
    /// Panics otherwise.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        let real = effects.iter().filter(|e| !matches!(e, Effect::None)).count();
        assert_eq!(real, 0, "expected no effects, got {effects:?}");
    }

    /// Exactly `expected` top-level effects
    ///
    /// # Panics
    ///
    /// Panics on a different count.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(effects.len(), expected, "wrong number of effects");
    }

    /// At least one future, possibly wrapped
    ///
    /// # Panics
    ///
    /// Panics if there is none.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            any(effects, &|e| matches!(e, Effect::Future(_))),
            "expected a future effect"
        );
    }

    /// A cancellable effect registered under `id`
    ///
    /// # Panics
    ///
    /// Panics if there is none.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancellable_effect<A>(effects: &[Effect<A>], id: &str) {
        assert!(
            any(effects, &|e| matches!(e, Effect::Cancellable { id: found, .. } if found.as_str() == id)),
            "expected a cancellable effect under {id}"
        );
    }

    /// An [`Effect::Cancel`] for `id`
    ///
    /// # Panics
    ///
    /// Panics if there is none.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_cancel_effect<A>(effects: &[Effect<A>], id: &str) {
        assert!(
            any(effects, &|e| matches!(e, Effect::Cancel(found) if found.as_str() == id)),
            "expected a cancel for {id}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopdesk_core::effect::EffectId;
    use shopdesk_core::{smallvec, SmallVec};

    #[derive(Clone, Debug, Default)]
    struct Queue {
        open: Vec<u32>,
    }

    #[derive(Clone, Debug)]
    enum QueueAction {
        Open(u32),
        Close(u32),
        Loaded(u32),
    }

    struct QueueReducer;

    impl Reducer for QueueReducer {
        type State = Queue;
        type Action = QueueAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                QueueAction::Open(id) => {
                    state.open.push(id);
                    smallvec![
                        Effect::future(async move { Some(QueueAction::Loaded(id)) })
                            .cancellable(EffectId::new(format!("ticket-{id}")))
                    ]
                },
                QueueAction::Close(id) => {
                    state.open.retain(|open| *open != id);
                    smallvec![Effect::Cancel(EffectId::new(format!("ticket-{id}")))]
                },
                QueueAction::Loaded(_) => smallvec![Effect::None],
            }
        }
    }

    #[test]
    fn test_history_is_applied_before_the_action() {
        let outcome = ReducerTest::new(QueueReducer)
            .with_env(())
            .given_state(Queue::default())
            .given_actions([QueueAction::Open(1), QueueAction::Open(2)])
            .when_action(QueueAction::Close(1))
            .then_state(|queue| assert_eq!(queue.open, vec![2]))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_cancel_effect(effects, "ticket-1");
            })
            .run();

        assert_eq!(outcome.effects.len(), 1);
    }

    #[test]
    fn test_nested_effects_are_found() {
        ReducerTest::new(QueueReducer)
            .with_env(())
            .given_state(Queue::default())
            .when_action(QueueAction::Open(7))
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
                assertions::assert_has_cancellable_effect(effects, "ticket-7");
            })
            .run();
    }

    #[test]
    fn test_none_counts_as_no_effects() {
        let outcome = ReducerTest::new(QueueReducer)
            .with_env(())
            .given_state(Queue::default())
            .when_action(QueueAction::Loaded(3))
            .run();

        assertions::assert_no_effects(&outcome.effects);
        assertions::assert_no_effects::<QueueAction>(&[]);
    }

    #[test]
    #[should_panic(expected = "expected a cancel for ticket-9")]
    fn test_missing_cancel_fails() {
        assertions::assert_has_cancel_effect::<QueueAction>(&[Effect::None], "ticket-9");
    }
}
