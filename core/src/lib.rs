//! # Shopdesk Core
//!
//! Core traits and types for the Shopdesk state core.
//!
//! This crate provides the vocabulary every slice of the dashboard state is
//! written in: reducers that transition state, effects that describe the I/O
//! a transition asks for, and the injected environment.
//!
//! ## Core Concepts
//!
//! - **State**: Client-local mirror of one slice of server state
//! - **Action**: All possible inputs to a reducer (requests and their lifecycle results)
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```
//! use shopdesk_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         match action {
//!             CounterAction::Increment => state.count += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = CounterState::default();
//! let _ = CounterReducer.reduce(&mut state, CounterAction::Increment, &());
//! assert_eq!(state.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities
pub mod composition;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They never perform I/O themselves; anything asynchronous is returned as an
/// [`Effect`](crate::effect::Effect) for the runtime to execute.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates state in place and returns effect descriptions to be
        /// executed by the runtime. Must not block and must not panic.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and can be cancelled by id.
pub mod effect {
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;

    /// Identifier used to cancel in-flight effects
    ///
    /// Any number of running effects may share one id; cancelling the id
    /// aborts all of them.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(String);

    impl EffectId {
        /// Creates an effect id from any string-like value
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        /// Returns the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<&str> for EffectId {
        fn from(id: &str) -> Self {
            Self::new(id)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run `effect` so that it can later be aborted with [`Effect::Cancel`]
        Cancellable {
            /// Cancellation id
            id: EffectId,
            /// The effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort every running effect registered under this id
        ///
        /// An aborted effect never feeds an action back into the store.
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async block that may feed an action back into the store
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Make this effect cancellable under `id`
        #[must_use]
        pub fn cancellable(self, id: impl Into<EffectId>) -> Effect<Action> {
            Effect::Cancellable {
                id: id.into(),
                effect: Box::new(self),
            }
        }

        /// Returns true for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Lift an effect into a parent action type
        ///
        /// Used when a child reducer is scoped into a parent: the child's
        /// effects produce child actions, which must be embedded before they
        /// reach the parent store.
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            Action: Send + 'static,
            B: Send + 'static,
            F: Fn(Action) -> B + Send + Sync + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(f) })),
                Effect::Cancellable { id, effect } => Effect::Cancellable {
                    id,
                    effect: Box::new(effect.map(f)),
                },
                Effect::Cancel(id) => Effect::Cancel(id),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Severity of a user-visible notification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum NotificationLevel {
        /// An operation completed
        Success,
        /// An operation failed
        Error,
        /// Neutral information
        Info,
    }

    /// A one-shot, transient message for the user (a "toast")
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Notification {
        /// Severity
        pub level: NotificationLevel,
        /// Text shown to the user
        pub message: String,
    }

    impl Notification {
        /// Success notification
        #[must_use]
        pub fn success(message: impl Into<String>) -> Self {
            Self {
                level: NotificationLevel::Success,
                message: message.into(),
            }
        }

        /// Error notification
        #[must_use]
        pub fn error(message: impl Into<String>) -> Self {
            Self {
                level: NotificationLevel::Error,
                message: message.into(),
            }
        }

        /// Informational notification
        #[must_use]
        pub fn info(message: impl Into<String>) -> Self {
            Self {
                level: NotificationLevel::Info,
                message: message.into(),
            }
        }
    }

    /// Notifier trait - delivers transient messages to whoever renders them
    ///
    /// Delivery is fire-and-forget; a notifier with no listeners drops the message.
    pub trait Notifier: Send + Sync {
        /// Deliver one notification
        fn notify(&self, notification: Notification);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::effect::{Effect, EffectId};

    #[derive(Debug, Clone, PartialEq)]
    enum Child {
        Loaded(u32),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Parent {
        Child(Child),
    }

    #[tokio::test]
    async fn map_lifts_future_output() {
        let effect = Effect::future(async { Some(Child::Loaded(7)) }).cancellable("req-1");

        let Effect::Cancellable { id, effect } = effect.map(Parent::Child) else {
            panic!("expected cancellable effect");
        };
        assert_eq!(id, EffectId::new("req-1"));

        let Effect::Future(fut) = *effect else {
            panic!("expected future effect");
        };
        assert_eq!(fut.await, Some(Parent::Child(Child::Loaded(7))));
    }

    #[test]
    fn cancel_survives_map() {
        let effect: Effect<Child> = Effect::Cancel(EffectId::new("req-9"));
        assert!(matches!(effect.map(Parent::Child), Effect::Cancel(id) if id.as_str() == "req-9"));
    }
}
