//! Event channel - status reporting from the emulation thread to the controller
//!
//! The emulation thread pushes [`Event`]s through an [`EventSender`]; the
//! controller drains them on its polling tick through the [`EventReceiver`].
//! The queue is unbounded: a push never waits for the consumer and never
//! drops an event.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Initial capacity of the event queue
pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// Status message emitted by the emulation core
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Informational message
    Log(String),
    /// Failure report
    Error(String),
}

impl Event {
    /// Whether this event reports a failure
    pub fn is_error(&self) -> bool {
        matches!(self, Event::Error(_))
    }

    /// Message text
    pub fn message(&self) -> &str {
        match self {
            Event::Log(text) | Event::Error(text) => text,
        }
    }
}

/// Producer side of the event channel. Cheap to clone; every clone feeds the
/// same queue.
#[derive(Debug, Clone)]
pub struct EventSender {
    queue: Arc<Mutex<VecDeque<Event>>>,
}

impl EventSender {
    /// Append an event to the queue
    pub fn push(&self, event: Event) {
        self.queue.lock().push_back(event);
    }

    /// Push an informational event
    pub fn log(&self, text: impl Into<String>) {
        self.push(Event::Log(text.into()));
    }

    /// Push a failure event
    pub fn error(&self, text: impl Into<String>) {
        self.push(Event::Error(text.into()));
    }
}

/// Consumer side of the event channel (owned by the lifecycle controller)
#[derive(Debug)]
pub struct EventReceiver {
    queue: Arc<Mutex<VecDeque<Event>>>,
}

impl EventReceiver {
    /// Remove and return every queued event in FIFO order.
    ///
    /// Returns an empty vector when nothing is pending.
    pub fn drain_all(&self) -> Vec<Event> {
        let mut queue = self.queue.lock();
        queue.drain(..).collect()
    }

    /// Try to receive a single event (non-blocking)
    pub fn try_recv(&self) -> Option<Event> {
        self.queue.lock().pop_front()
    }

    /// Check if there are pending events
    pub fn has_pending(&self) -> bool {
        !self.queue.lock().is_empty()
    }
}

/// Create a new event channel pair (sender, receiver)
pub fn create_event_channel() -> (EventSender, EventReceiver) {
    let queue = Arc::new(Mutex::new(VecDeque::with_capacity(EVENT_QUEUE_CAPACITY)));

    let sender = EventSender {
        queue: Arc::clone(&queue),
    };
    let receiver = EventReceiver { queue };

    (sender, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_drain_empty_channel() {
        let (_sender, receiver) = create_event_channel();
        assert!(!receiver.has_pending());
        assert!(receiver.drain_all().is_empty());
    }

    #[test]
    fn test_drain_preserves_push_order() {
        let (sender, receiver) = create_event_channel();

        sender.log("Loaded ROM: a.z64");
        sender.error("boom");
        sender.log("after");

        assert!(receiver.has_pending());
        let events = receiver.drain_all();
        assert_eq!(
            events,
            vec![
                Event::Log("Loaded ROM: a.z64".to_string()),
                Event::Error("boom".to_string()),
                Event::Log("after".to_string()),
            ]
        );
        assert!(receiver.drain_all().is_empty());
    }

    #[test]
    fn test_try_recv_pops_front() {
        let (sender, receiver) = create_event_channel();
        sender.log("first");
        sender.log("second");

        assert_eq!(receiver.try_recv(), Some(Event::Log("first".to_string())));
        assert_eq!(receiver.drain_all(), vec![Event::Log("second".to_string())]);
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        const PRODUCERS: usize = 4;
        const PER_PRODUCER: usize = 500;

        let (sender, receiver) = create_event_channel();

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let sender = sender.clone();
                thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        sender.log(format!("{p}:{i}"));
                    }
                })
            })
            .collect();

        // Drain while producers are still running
        let mut received = Vec::new();
        while handles.iter().any(|h| !h.is_finished()) {
            received.extend(receiver.drain_all());
        }
        for handle in handles {
            handle.join().unwrap();
        }
        received.extend(receiver.drain_all());

        assert_eq!(received.len(), PRODUCERS * PER_PRODUCER);

        // Per-producer order must survive the interleaving
        for p in 0..PRODUCERS {
            let prefix = format!("{p}:");
            let seq: Vec<usize> = received
                .iter()
                .filter_map(|e| e.message().strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(seq, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_event_accessors() {
        let err = Event::Error("bad".to_string());
        assert!(err.is_error());
        assert_eq!(err.message(), "bad");
        assert!(!Event::Log("ok".to_string()).is_error());
    }
}
