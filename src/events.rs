//! Encounter event bus.
//!
//! Publishing fans an event out to the mailbox of every subscriber whose
//! topics match.  Subscribers drain their own mailbox with `poll` when the
//! game loop gives them a turn, so nothing runs re-entrantly inside `publish`.
//! Subscribing and unsubscribing is the integration layer's job.

use std::collections::{BTreeMap, VecDeque};

use crate::entities::{EncounterEvent, EventTopic};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u32);

#[derive(Debug)]
struct Subscriber {
    topics: Vec<EventTopic>,
    mailbox: VecDeque<EncounterEvent>,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_id: u32,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
    /// Events published since the last `take_history`, oldest first.
    /// `None` unless the bus was built with `with_history`.
    history: Option<Vec<EncounterEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that also records every publication for `take_history`.
    pub fn with_history() -> Self {
        Self {
            history: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn subscribe(&mut self, topics: &[EventTopic]) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(
            id,
            Subscriber {
                topics: topics.to_vec(),
                mailbox: VecDeque::new(),
            },
        );
        id
    }

    /// Undelivered events for `id` are dropped.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.remove(&id);
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers.contains_key(&id)
    }

    pub fn publish(&mut self, event: EncounterEvent) {
        let topic = event.topic();
        for sub in self.subscribers.values_mut() {
            if sub.topics.contains(&topic) {
                sub.mailbox.push_back(event.clone());
            }
        }
        if let Some(history) = &mut self.history {
            history.push(event);
        }
    }

    /// Drain everything queued for `id`, oldest first.
    pub fn poll(&mut self, id: SubscriptionId) -> Vec<EncounterEvent> {
        self.subscribers
            .get_mut(&id)
            .map(|sub| sub.mailbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Drain the recorded history; always empty on a bus without one.
    pub fn take_history(&mut self) -> Vec<EncounterEvent> {
        self.history.as_mut().map(std::mem::take).unwrap_or_default()
    }
}
