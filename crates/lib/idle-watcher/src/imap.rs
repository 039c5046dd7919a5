//! IDLE with fallback polling over an `async-imap` session.

use std::sync::Arc;
use std::time::Duration;

use async_imap::extensions::idle::IdleResponse;
use tokio_util::sync::CancellationToken;

use crate::{LongPoll, MailboxEvent, Relay};

/// Errors of the IMAP long-poll.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IMAP protocol error.
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),
}

/// A selected session kept in IDLE, or polled with `NOOP` when the server
/// lacks the IDLE capability.
#[derive(Debug)]
pub struct ImapLongPoll<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    session: async_imap::Session<S>,
    fallback: Duration,
    idle: bool,
}

impl<S> ImapLongPoll<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug + 'static,
{
    /// Wrap a session that has the watched mailbox selected.
    ///
    /// A zero `fallback` selects [`crate::DEFAULT_FALLBACK`].
    pub async fn new(
        mut session: async_imap::Session<S>,
        fallback: Duration,
    ) -> Result<Self, Error> {
        let capabilities = session.capabilities().await?;
        let idle = capabilities.has_str("IDLE");
        let fallback = crate::effective_fallback(fallback);

        if !idle {
            tracing::info!(
                fallback_secs = fallback.as_secs(),
                "server does not advertise IDLE, polling instead"
            );
        }

        Ok(Self {
            session,
            fallback,
            idle,
        })
    }

    /// Whether the server supports IDLE.
    pub fn supports_idle(&self) -> bool {
        self.idle
    }
}

/// What ended one wait.
enum Wake {
    Cancelled,
    Fallback,
    Data(MailboxEvent),
}

impl<S> LongPoll for ImapLongPoll<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug + 'static,
{
    type Error = Error;

    async fn run(self, relay: Arc<Relay>, cancel: CancellationToken) -> Result<Self, Self::Error> {
        let Self {
            mut session,
            fallback,
            idle,
        } = self;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let (next, wake) = if idle {
                idle_once(session, fallback, &cancel).await?
            } else {
                sleep_once(session, fallback, &cancel).await
            };
            session = next;

            match wake {
                Wake::Cancelled => break,
                Wake::Data(event) => publish(&relay, event),
                Wake::Fallback => {
                    tracing::debug!("fallback interval elapsed, checking mailbox");
                    session.noop().await?;
                    publish(&relay, MailboxEvent::MailboxChanged);
                }
            }

            while let Ok(response) = session.unsolicited_responses.try_recv() {
                publish(&relay, MailboxEvent::from_unsolicited(&response));
            }
        }

        Ok(Self {
            session,
            fallback,
            idle,
        })
    }

    async fn close(mut self) -> Result<(), Self::Error> {
        self.session.logout().await?;
        Ok(())
    }
}

fn publish(relay: &Relay, event: MailboxEvent) {
    let outcome = relay.publish(event.clone());
    tracing::debug!(%event, ?outcome, "mailbox event");
}

async fn idle_once<S>(
    session: async_imap::Session<S>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(async_imap::Session<S>, Wake), Error>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    let mut handle = session.idle();
    handle.init().await?;

    let response = {
        let (wait, stop) = handle.wait_with_timeout(timeout);
        let mut wait = std::pin::pin!(wait);
        let mut stop = Some(stop);

        loop {
            tokio::select! {
                response = &mut wait => break response?,
                () = cancel.cancelled(), if stop.is_some() => {
                    // Interrupts the wait with `ManualInterrupt`.
                    stop = None;
                }
            }
        }
    };

    let session = handle.done().await?;

    let wake = match response {
        IdleResponse::ManualInterrupt => Wake::Cancelled,
        IdleResponse::Timeout => Wake::Fallback,
        IdleResponse::NewData(data) => Wake::Data(MailboxEvent::from_response(data.parsed())),
    };

    Ok((session, wake))
}

async fn sleep_once<S>(
    session: async_imap::Session<S>,
    interval: Duration,
    cancel: &CancellationToken,
) -> (async_imap::Session<S>, Wake)
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    tokio::select! {
        () = tokio::time::sleep(interval) => (session, Wake::Fallback),
        () = cancel.cancelled() => (session, Wake::Cancelled),
    }
}
