//! Mailbox change watching over a dedicated long-lived session.
//!
//! A [`LongPoll`] implementation runs as its own task and publishes
//! [`MailboxEvent`]s into a [`Relay`]; the consuming loop receives them one at
//! a time and decides which ones trigger work.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

mod event;
mod imap;
mod relay;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use event::MailboxEvent;
pub use imap::{Error as ImapError, ImapLongPoll};
pub use relay::{Publish, Relay};

/// The fallback interval used when none is configured.
///
/// Stays below the 30 minute inactivity timeout servers apply to IDLE.
pub const DEFAULT_FALLBACK: Duration = Duration::from_secs(25 * 60);

/// Resolve a configured fallback interval; zero selects the default.
pub fn effective_fallback(configured: Duration) -> Duration {
    if configured.is_zero() {
        DEFAULT_FALLBACK
    } else {
        configured
    }
}

/// A session that can sit in a server-side long-poll.
pub trait LongPoll: Send + Sized + 'static {
    /// The error type of the long-poll.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publish mailbox events into the relay until cancelled.
    ///
    /// Hands the session back on cancellation. An error means the session
    /// is gone.
    fn run(
        self,
        relay: Arc<Relay>,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Self, Self::Error>> + Send;

    /// Release the session.
    fn close(self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
