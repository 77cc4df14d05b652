//! Notification Bus - Observer Surface for State Changes
//!
//! The coordinator and synchronizer publish [`CoreEvent`]s here;
//! consumers (UI, logs, tests) subscribe without coupling to the
//! publishers. Built on `tokio::sync::broadcast`: dropping a receiver
//! unsubscribes, and slow subscribers lag rather than block the core.

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::events::CoreEvent;

/// Publish/subscribe bus for typed core events.
#[derive(Debug, Clone)]
pub struct NotificationBus {
  sender: broadcast::Sender<CoreEvent>,
}

impl NotificationBus {
  /// Create a bus with the given channel capacity.
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  /// Subscribe to all events published after this call.
  ///
  /// The returned receiver is the unsubscribe handle: drop it to stop
  /// receiving.
  pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
    self.sender.subscribe()
  }

  /// Publish an event to all current subscribers.
  ///
  /// Publishing with no subscribers is not an error; the event is
  /// simply dropped.
  pub fn publish(&self, event: CoreEvent) {
    trace!(?event, "Publishing core event");
    let _ = self.sender.send(event);
  }

  /// Number of live subscribers.
  pub fn subscriber_count(&self) -> usize {
    self.sender.receiver_count()
  }
}

impl Default for NotificationBus {
  fn default() -> Self {
    Self::new(256)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::transaction::TxStatus;
  use uuid::Uuid;

  #[tokio::test]
  async fn test_subscriber_receives_published_events() {
    let bus = NotificationBus::new(8);
    let mut rx = bus.subscribe();

    let id = Uuid::new_v4();
    bus.publish(CoreEvent::Transaction {
      id,
      status: TxStatus::Submitted,
      failure: None,
    });

    match rx.recv().await.unwrap() {
      CoreEvent::Transaction { id: got, status, .. } => {
        assert_eq!(got, id);
        assert_eq!(status, TxStatus::Submitted);
      }
      other => panic!("unexpected event: {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_publish_without_subscribers_is_noop() {
    let bus = NotificationBus::new(8);
    bus.publish(CoreEvent::Transaction {
      id: Uuid::new_v4(),
      status: TxStatus::Failed,
      failure: None,
    });
    assert_eq!(bus.subscriber_count(), 0);
  }

  #[tokio::test]
  async fn test_dropping_receiver_unsubscribes() {
    let bus = NotificationBus::new(8);
    let rx = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);
    drop(rx);
    assert_eq!(bus.subscriber_count(), 0);
  }
}
