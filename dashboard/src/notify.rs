//! Notification delivery
//!
//! Mutations announce their outcome exactly once through a
//! [`Notifier`]. Views (or the binary's log task) subscribe to a
//! [`BroadcastNotifier`] and render each message as a toast.

use shopdesk_core::environment::{Notification, NotificationLevel, Notifier};
use tokio::sync::broadcast;

/// Fans notifications out to every current subscriber
///
/// Notifications sent while nobody is subscribed are dropped; a subscriber
/// that falls more than `capacity` messages behind skips the oldest ones.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    /// Create a notifier buffering up to `capacity` messages per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every notification sent from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notification: Notification) {
        tracing::debug!(level = ?notification.level, message = %notification.message, "Notification");
        // No subscribers is fine
        let _ = self.sender.send(notification);
    }
}

/// Writes notifications to the log instead of a UI
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        log_notification(&notification);
    }
}

/// Log one notification at a level matching its severity
pub fn log_notification(notification: &Notification) {
    match notification.level {
        NotificationLevel::Success | NotificationLevel::Info => {
            tracing::info!(message = %notification.message, "notification");
        },
        NotificationLevel::Error => {
            tracing::warn!(message = %notification.message, "notification");
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_notifications() {
        let notifier = BroadcastNotifier::new(4);
        let mut rx = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        notifier.notify(Notification::success("Task created successfully"));

        assert_eq!(
            rx.recv().await.unwrap(),
            Notification::success("Task created successfully")
        );
    }

    #[test]
    fn notify_without_subscribers_is_dropped() {
        let notifier = BroadcastNotifier::new(0);
        notifier.notify(Notification::error("Failed"));
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
