use crate::types::LogEntry;
use std::sync::{Arc, Mutex};

pub type Subscriber = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Holds at most one subscriber; the last one set wins.
#[derive(Default)]
pub struct SubscriberSlot {
    current: Mutex<Option<Subscriber>>,
}

impl SubscriberSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current subscriber. `None` empties the slot.
    pub fn set(&self, subscriber: Option<Subscriber>) {
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        *current = subscriber;
    }

    pub fn is_set(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }

    /// Calls the current subscriber, if any. Events with no subscriber are dropped.
    pub fn notify(&self, entry: &LogEntry) {
        // Release the lock before calling out so the callback may re-subscribe.
        let subscriber = self
            .current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();

        if let Some(subscriber) = subscriber {
            subscriber(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiLogEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entry() -> LogEntry {
        LogEntry::Api(ApiLogEntry {
            id: "a".to_string(),
            timestamp: 0,
            duration: 0,
            method: "GET".to_string(),
            url: "https://api.example.com".to_string(),
            status: Some(200),
            success: true,
            request_body: None,
            response_body: None,
            error: None,
        })
    }

    fn counter() -> (Arc<AtomicUsize>, Subscriber) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let subscriber: Subscriber = Arc::new(move |_: &LogEntry| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscriber)
    }

    #[test]
    fn empty_slot_drops_events() {
        let slot = SubscriberSlot::new();
        assert!(!slot.is_set());
        slot.notify(&entry());
    }

    #[test]
    fn new_subscriber_supersedes_previous() {
        let slot = SubscriberSlot::new();
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        slot.set(Some(first_cb));
        slot.notify(&entry());
        slot.set(Some(second_cb));
        slot.notify(&entry());
        slot.notify(&entry());

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn clearing_stops_delivery() {
        let slot = SubscriberSlot::new();
        let (count, cb) = counter();
        slot.set(Some(cb));
        slot.set(None);
        slot.notify(&entry());

        assert!(!slot.is_set());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
