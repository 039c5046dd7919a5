//! The operations the pipeline needs from either side.

use crate::{Message, UidSet};

/// The mail store messages are moved away from.
pub trait SourceStore: Send {
    /// The error type of the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the mailbox read-only and return its message count.
    fn examine(&mut self, mailbox: &str) -> impl Future<Output = Result<u32, Self::Error>> + Send;

    /// Fetch messages `1..=count` of the examined mailbox into the outlet.
    ///
    /// Must keep draining the server response even after the outlet closed.
    fn fetch_all(
        &mut self,
        count: u32,
        outlet: &mut Outlet,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Open the mailbox read-write.
    fn select(&mut self, mailbox: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Add `\Deleted` to the messages with the given UIDs.
    fn mark_deleted(
        &mut self,
        uids: &UidSet,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// The mail store messages are moved to.
pub trait TargetStore: Send {
    /// The error type of the store.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open the mailbox read-write.
    fn select(&mut self, mailbox: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Append the message with its flags and internal date.
    fn append(
        &mut self,
        mailbox: &str,
        message: &Message,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// The sending end of the fetch queue.
///
/// Once the consumer is gone the outlet turns into a sink, so the producer
/// can finish reading the server response.
#[derive(Debug)]
pub struct Outlet {
    sender: tokio::sync::mpsc::Sender<Message>,
    open: bool,
    delivered: u32,
}

impl Outlet {
    pub(crate) fn new(sender: tokio::sync::mpsc::Sender<Message>) -> Self {
        Self {
            sender,
            open: true,
            delivered: 0,
        }
    }

    /// Hand a message to the consumer, waiting for queue space.
    pub async fn push(&mut self, message: Message) {
        if !self.open {
            return;
        }

        if self.sender.send(message).await.is_err() {
            tracing::debug!("fetch queue closed, discarding the rest");
            self.open = false;
            return;
        }

        self.delivered += 1;
    }

    /// Whether the consumer still accepts messages.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of messages accepted by the consumer.
    pub fn delivered(&self) -> u32 {
        self.delivered
    }
}
