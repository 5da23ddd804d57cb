//! Notifications published by the session for renderers, views and telemetry.
//!
//! Delivery is fire-and-forget. Subscribers are called in registration order,
//! but callers must not rely on that order, and a panicking subscriber is
//! caught and logged without affecting the session or the other subscribers.
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::data::SliceDefinition;

/// Observable session event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    SpinStarted,
    /// Command for the renderer: animate to `target_index` over `rotation_magnitude` degrees.
    SpinResolved {
        target_index: usize,
        rotation_magnitude: f32,
        duration_secs: f32,
    },
    /// Authoritative result; `slice` is `None` for an empty slot.
    SpinCompleted {
        index: usize,
        slice: Option<SliceDefinition>,
    },
    ZoneChanged { zone: u32 },
    RewardChanged { temporary: u64, banked: u64 },
    BombTriggered { forfeited: u64 },
    WalkAway { banked: u64 },
    ItemConverted { item: String, gold: u64 },
}

impl SessionEvent {
    /// Short stable name, for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SpinStarted => "spin_started",
            Self::SpinResolved { .. } => "spin_resolved",
            Self::SpinCompleted { .. } => "spin_completed",
            Self::ZoneChanged { .. } => "zone_changed",
            Self::RewardChanged { .. } => "reward_changed",
            Self::BombTriggered { .. } => "bomb_triggered",
            Self::WalkAway { .. } => "walk_away",
            Self::ItemConverted { .. } => "item_converted",
        }
    }
}

/// Receiver of session events.
pub trait EventSink {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&SessionEvent),
{
    fn on_event(&mut self, event: &SessionEvent) {
        self(event);
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SubscriberId, Box<dyn EventSink>)>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: impl EventSink + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.subscribers.push((id, Box::new(sink)));
        id
    }

    /// Remove a subscriber; returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn publish(&mut self, event: &SessionEvent) {
        for (id, sink) in &mut self.subscribers {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| sink.on_event(event)));
            if delivered.is_err() {
                log::error!("subscriber {id:?} panicked handling {}", event.name());
            }
        }
    }
}

/// Shared in-memory record of events; clones observe the same log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<SessionEvent>>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<SessionEvent> {
        self.events.borrow().clone()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }
}

impl EventSink for EventLog {
    fn on_event(&mut self, event: &SessionEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
