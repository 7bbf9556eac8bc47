//! Outbound navigation events.
//!
//! The engine publishes state transitions, step changes, route swaps, and
//! arrival over plain channels. Fire-and-observe: no acknowledgement, and a
//! dropped receiver is pruned on the next emit.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::engine::NavigationState;
use crate::route::Route;

/// Event raised by the navigation engine.
#[derive(Clone, Debug, PartialEq)]
pub enum NavEvent {
    StateChanged(NavigationState),
    /// The current step index advanced (or was reset by a route swap).
    StepChanged(usize),
    /// The user came within the arrival radius of the destination.
    Arrived,
    /// The active route was replaced (`None` when navigation stopped).
    RouteUpdated(Option<Arc<Route>>),
}

/// Fan-out bus: every subscriber receives a clone of every event.
pub(crate) struct EventBus {
    senders: Mutex<Vec<Sender<NavEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> Receiver<NavEvent> {
        let (tx, rx) = unbounded();
        self.senders.lock().push(tx);
        rx
    }

    pub fn emit(&self, event: NavEvent) {
        self.senders
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_subscriber_sees_the_event() {
        let bus = EventBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        bus.emit(NavEvent::StepChanged(3));

        assert_eq!(rx1.try_recv().unwrap(), NavEvent::StepChanged(3));
        assert_eq!(rx2.try_recv().unwrap(), NavEvent::StepChanged(3));
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();
        drop(rx1);

        bus.emit(NavEvent::Arrived);
        bus.emit(NavEvent::StepChanged(1));

        assert_eq!(bus.senders.lock().len(), 1);
        assert_eq!(rx2.try_recv().unwrap(), NavEvent::Arrived);
        assert_eq!(rx2.try_recv().unwrap(), NavEvent::StepChanged(1));
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.emit(NavEvent::Arrived);
    }
}
