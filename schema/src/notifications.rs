use std::collections::VecDeque;
use std::time::SystemTime;

use crate::Transition;

/// A line of text describing something that happened on the board
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub at: SystemTime,
    pub message: String,
}

/// Rolling feed holding the most recent notifications, newest first
#[derive(Clone, Debug)]
pub struct NotificationFeed {
    capacity: usize,
    entries: VecDeque<Notification>,
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl NotificationFeed {
    pub const DEFAULT_CAPACITY: usize = 5;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, at: SystemTime, message: String) {
        self.entries.push_front(Notification { at, message });
        self.entries.truncate(self.capacity);
    }

    /// Record every message produced by `transition`
    pub fn record(&mut self, at: SystemTime, transition: &Transition) {
        for message in transition.messages() {
            self.push(at, message);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Order, OrderId, OrderStatus};

    #[test]
    fn test_keeps_newest_five() {
        let mut feed = NotificationFeed::default();
        for i in 0..8 {
            feed.push(SystemTime::UNIX_EPOCH, format!("event {}", i));
        }

        let messages = feed.iter().map(|n| n.message.as_str()).collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec!["event 7", "event 6", "event 5", "event 4", "event 3"]
        );
    }

    #[test]
    fn test_record_transition() {
        let mut feed = NotificationFeed::with_capacity(3);
        let order = Order {
            id: OrderId::new("1"),
            status: OrderStatus::Delivered,
            ..Default::default()
        };
        feed.record(
            SystemTime::UNIX_EPOCH,
            &Transition::StatusChanged {
                order: order.clone(),
                from: OrderStatus::InProgress,
            },
        );
        feed.record(SystemTime::UNIX_EPOCH, &Transition::Unchanged(order));

        assert_eq!(feed.len(), 1);
        assert_eq!(
            feed.iter().next().map(|n| n.message.as_str()),
            Some("Order 1 status updated to delivered")
        );
    }
}
