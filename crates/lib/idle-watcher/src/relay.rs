//! Single-slot coalescing hand-off between the long-poll task and the
//! consuming loop.

use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

use crate::MailboxEvent;

/// What happened to a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Publish {
    /// The slot was empty.
    Queued,

    /// A pending trigger already covers this event.
    Coalesced,

    /// The pending non-trigger event was replaced by this one.
    Replaced,
}

/// Holds at most one pending event.
///
/// A pending trigger is never replaced: further events collapse into it, so
/// a burst of changes during a cycle yields exactly one more cycle. A pending
/// non-trigger event is replaced by whatever comes next.
#[derive(Debug, Default)]
pub struct Relay {
    slot: Mutex<Option<MailboxEvent>>,
    notify: Notify,
}

impl Relay {
    /// Create an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer an event to the consumer.
    pub fn publish(&self, event: MailboxEvent) -> Publish {
        let outcome = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                None => {
                    *slot = Some(event);
                    Publish::Queued
                }
                Some(pending) if pending.is_trigger() => Publish::Coalesced,
                Some(_) => {
                    *slot = Some(event);
                    Publish::Replaced
                }
            }
        };

        self.notify.notify_one();
        outcome
    }

    /// Take the pending event, if any.
    pub fn try_recv(&self) -> Option<MailboxEvent> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Wait for the next event.
    ///
    /// Cancel-safe: an event is only removed from the slot when returned.
    pub async fn recv(&self) -> MailboxEvent {
        loop {
            if let Some(event) = self.try_recv() {
                return event;
            }
            self.notify.notified().await;
        }
    }
}
