//! A scripted long-poll for exercising consumers of the relay.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{LongPoll, MailboxEvent, Relay};

/// Failure injected by [`FakeLongPoll`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("long-poll connection dropped")]
pub struct Dropped;

/// Publishes a fixed script of events, then waits for cancellation or
/// fails.
#[derive(Debug, Default)]
pub struct FakeLongPoll {
    /// Events to publish, each after `spacing`.
    pub script: Vec<MailboxEvent>,

    /// Delay before each scripted event.
    pub spacing: Duration,

    /// Fail once the script is exhausted instead of waiting.
    pub fail_after_script: bool,

    /// Whether `close` was called.
    pub closed: Arc<std::sync::atomic::AtomicBool>,
}

impl LongPoll for FakeLongPoll {
    type Error = Dropped;

    async fn run(
        mut self,
        relay: Arc<Relay>,
        cancel: CancellationToken,
    ) -> Result<Self, Self::Error> {
        for event in std::mem::take(&mut self.script) {
            tokio::select! {
                () = tokio::time::sleep(self.spacing) => {}
                () = cancel.cancelled() => return Ok(self),
            }
            relay.publish(event);
        }

        if self.fail_after_script {
            return Err(Dropped);
        }

        cancel.cancelled().await;
        Ok(self)
    }

    async fn close(self) -> Result<(), Self::Error> {
        self.closed
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
