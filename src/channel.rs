//! Latest-wins control channels
//!
//! Each externally tunable topic gets one single-slot channel. A publish
//! overwrites whatever is pending, so a controller that falls behind a
//! burst of messages only ever sees the freshest state. Older messages are
//! dropped on purpose: completeness is traded for always-fresh parameters
//! under load.

use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A decoded control message: which sub-field of the topic to update, and
/// the new value. For toggles the 0/1 convention applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlMessage {
    pub selector: i32,
    pub value: f32,
}

impl ControlMessage {
    pub fn new(selector: i32, value: f32) -> Self {
        Self { selector, value }
    }
}

struct Slot {
    pending: Mutex<Option<ControlMessage>>,
    notify: Notify,
}

/// Create a single-slot channel for one control topic.
///
/// The publisher side is cheaply cloneable (the OSC listener holds one per
/// topic); the consumer side is unique, matching the single-consumer
/// contract of a controller loop.
pub fn control_channel(topic: &'static str) -> (Publisher, Consumer) {
    let slot = Arc::new(Slot {
        pending: Mutex::new(None),
        notify: Notify::new(),
    });
    (
        Publisher {
            topic,
            slot: Arc::clone(&slot),
        },
        Consumer { topic, slot },
    )
}

/// Write half of a control channel.
#[derive(Clone)]
pub struct Publisher {
    topic: &'static str,
    slot: Arc<Slot>,
}

impl Publisher {
    /// Overwrite the pending slot. Non-blocking, never fails.
    pub fn publish(&self, msg: ControlMessage) {
        *self.slot.pending.lock().unwrap() = Some(msg);
        self.slot.notify.notify_one();
    }

    pub fn topic(&self) -> &'static str {
        self.topic
    }
}

/// Read half of a control channel. Owned by exactly one controller loop.
pub struct Consumer {
    topic: &'static str,
    slot: Arc<Slot>,
}

impl Consumer {
    /// Suspend until a message is pending, then atomically take it.
    ///
    /// If several messages were published since the last take, only the
    /// most recent one is returned.
    pub async fn recv(&mut self) -> ControlMessage {
        loop {
            // Register interest before checking the slot, so a publish
            // that lands between the check and the await still wakes us.
            let notified = self.slot.notify.notified();
            if let Some(msg) = self.slot.pending.lock().unwrap().take() {
                return msg;
            }
            notified.await;
        }
    }

    pub fn topic(&self) -> &'static str {
        self.topic
    }
}
