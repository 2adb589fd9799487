//! # Shopdesk Testing
//!
//! Test doubles and harnesses shared by the workspace:
//!
//! - [`MockTransport`]: scripted backend, records every request
//! - [`RecordingNotifier`]: keeps notifications so tests can count them
//! - [`FixedClock`]: deterministic "now"
//! - [`ReducerTest`]: Given-When-Then for a single reducer
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.respond(Method::Get, "customers", json!({ "data": [] }));
//! let notifier = Arc::new(RecordingNotifier::new());
//!
//! let env = SliceEnvironment::new(Arc::new(transport.clone()), notifier.clone())
//!     .with_clock(Arc::new(test_clock()));
//! let store = build_store(env, StoreConfig::default());
//! store.send(CrudAction::<Customers>::list_all().into()).await?;
//! ```

use chrono::{DateTime, Utc};
use shopdesk_core::environment::Clock;

mod reducer_test;
mod transport;

pub use reducer_test::{assertions, ReducerTest};
pub use transport::MockTransport;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use shopdesk_core::environment::{Notification, NotificationLevel, Notifier};
    use std::sync::{Arc, Mutex};

    /// Clock stuck at one instant
    ///
    /// ```
    /// use shopdesk_testing::mocks::FixedClock;
    /// use shopdesk_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Clock that always reports `time`
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock fixed at 2025-01-01 00:00:00 UTC
    ///
    /// # Panics
    ///
    /// Never; the timestamp is a literal.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Notifier that keeps every notification for later inspection
    ///
    /// Clones share the same log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        log: Arc<Mutex<Vec<Notification>>>,
    }

    impl RecordingNotifier {
        /// Create an empty notifier
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every notification, in delivery order
        #[must_use]
        #[allow(clippy::expect_used)]
        pub fn notifications(&self) -> Vec<Notification> {
            self.log.lock().expect("notifier lock poisoned").clone()
        }

        /// Messages of success notifications
        #[must_use]
        pub fn successes(&self) -> Vec<String> {
            self.messages(NotificationLevel::Success)
        }

        /// Messages of error notifications
        #[must_use]
        pub fn errors(&self) -> Vec<String> {
            self.messages(NotificationLevel::Error)
        }

        fn messages(&self, level: NotificationLevel) -> Vec<String> {
            self.notifications()
                .into_iter()
                .filter(|n| n.level == level)
                .map(|n| n.message)
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        #[allow(clippy::expect_used)]
        fn notify(&self, notification: Notification) {
            self.log
                .lock()
                .expect("notifier lock poisoned")
                .push(notification);
        }
    }
}

/// Test setup
pub mod helpers {
    /// Route `tracing` output through the test harness
    ///
    /// Safe to call from every test; only the first call installs the subscriber.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

pub use mocks::{test_clock, FixedClock, RecordingNotifier};
