//! The per-trigger mirroring pipeline.
//!
//! Three concurrent stages joined by bounded queues:
//!
//! - fetch: examine the source mailbox and stream every message out;
//! - store: append each message to the target and report its UID;
//! - cleanup: once all UIDs are in, mark them `\Deleted` on the source.
//!
//! A UID only reaches cleanup after its append succeeded.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, mpsc};

mod imap;
mod message;
mod store;
mod uid_set;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use imap::Error as ImapError;
pub use message::{Flag, Message};
pub use store::{Outlet, SourceStore, TargetStore};
pub use uid_set::UidSet;

/// Capacity of the message and delete queues.
pub const QUEUE_CAPACITY: usize = 1;

/// Pipeline parameters.
#[derive(Debug, Clone)]
pub struct Params {
    /// Wire name of the source mailbox.
    pub source_mailbox: String,

    /// Wire name of the target mailbox.
    pub target_mailbox: String,
}

/// What a pipeline run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Messages handed over by the fetch stage.
    pub fetched: u32,

    /// Messages appended to the target.
    pub stored: u32,

    /// Messages skipped because they were already flagged as deleted.
    pub ignored: u32,

    /// Messages marked as deleted on the source.
    pub deleted: u32,
}

/// The first failure of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum Error<SourceError, TargetError> {
    /// Reading the source mailbox failed.
    #[error("fetch: {0}")]
    Fetch(#[source] SourceError),

    /// Appending to the target failed.
    #[error("store: {0}")]
    Store(#[source] TargetError),

    /// Marking messages as deleted on the source failed.
    #[error("cleanup: {0}")]
    Cleanup(#[source] SourceError),
}

type Errors<S, T> =
    mpsc::UnboundedSender<Error<<S as SourceStore>::Error, <T as TargetStore>::Error>>;

/// Move every message from the source mailbox to the target mailbox.
///
/// `stored` is incremented for each successful append. All stages run to
/// completion even after a failure; the earliest failure is returned.
pub async fn run<S, T>(
    source: &mut S,
    target: &mut T,
    params: &Params,
    stored: &AtomicU64,
) -> Result<Summary, Error<S::Error, T::Error>>
where
    S: SourceStore,
    T: TargetStore,
{
    let (message_tx, message_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (delete_tx, delete_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (error_tx, mut error_rx) = mpsc::unbounded_channel();

    let source = Mutex::new(source);

    let (fetched, (appended, ignored), deleted) = tokio::join!(
        fetch::<S, T>(&source, &params.source_mailbox, message_tx, error_tx.clone()),
        store::<S, T>(
            target,
            &params.target_mailbox,
            message_rx,
            delete_tx,
            stored,
            error_tx.clone()
        ),
        cleanup::<S, T>(&source, &params.source_mailbox, delete_rx, error_tx),
    );

    if let Ok(err) = error_rx.try_recv() {
        return Err(err);
    }

    let summary = Summary {
        fetched,
        stored: appended,
        ignored,
        deleted,
    };
    tracing::debug!(?summary, "pipeline finished");

    Ok(summary)
}

async fn fetch<S: SourceStore, T: TargetStore>(
    source: &Mutex<&mut S>,
    mailbox: &str,
    messages: mpsc::Sender<Message>,
    errors: Errors<S, T>,
) -> u32 {
    let mut source = source.lock().await;

    let count = match source.examine(mailbox).await {
        Ok(count) => count,
        Err(err) => {
            let _ = errors.send(Error::Fetch(err));
            return 0;
        }
    };

    if count == 0 {
        tracing::debug!(imap_mailbox = %mailbox, "source mailbox is empty");
        return 0;
    }

    tracing::debug!(imap_mailbox = %mailbox, count, "fetching messages");

    let mut outlet = Outlet::new(messages);
    if let Err(err) = source.fetch_all(count, &mut outlet).await {
        let _ = errors.send(Error::Fetch(err));
    }

    outlet.delivered()
}

async fn store<S: SourceStore, T: TargetStore>(
    target: &mut T,
    mailbox: &str,
    mut messages: mpsc::Receiver<Message>,
    deletes: mpsc::Sender<u32>,
    stored: &AtomicU64,
    errors: Errors<S, T>,
) -> (u32, u32) {
    let mut appended = 0;
    let mut ignored = 0;

    if let Err(err) = target.select(mailbox).await {
        let _ = errors.send(Error::Store(err));
        return (appended, ignored);
    }

    while let Some(message) = messages.recv().await {
        let uid = message.uid;

        if message.is_deleted() {
            tracing::info!(uid, "ignoring message already flagged as deleted");
            ignored += 1;
            continue;
        }

        let message = message.into_forwarded();
        if let Err(err) = target.append(mailbox, &message).await {
            let _ = errors.send(Error::Store(err));
            return (appended, ignored);
        }

        stored.fetch_add(1, Ordering::Relaxed);
        appended += 1;
        tracing::debug!(uid, imap_mailbox = %mailbox, "message stored");

        if deletes.send(uid).await.is_err() {
            break;
        }
    }

    (appended, ignored)
}

async fn cleanup<S: SourceStore, T: TargetStore>(
    source: &Mutex<&mut S>,
    mailbox: &str,
    mut deletes: mpsc::Receiver<u32>,
    errors: Errors<S, T>,
) -> u32 {
    let mut uids = UidSet::default();
    while let Some(uid) = deletes.recv().await {
        uids.insert(uid);
    }

    if uids.is_empty() {
        return 0;
    }

    let mut source = source.lock().await;

    if let Err(err) = source.select(mailbox).await {
        let _ = errors.send(Error::Cleanup(err));
        return 0;
    }

    if let Err(err) = source.mark_deleted(&uids).await {
        let _ = errors.send(Error::Cleanup(err));
        return 0;
    }

    tracing::debug!(%uids, "messages marked as deleted");

    u32::try_from(uids.len()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeError, FakeSource, FakeTarget};

    fn params() -> Params {
        Params {
            source_mailbox: "INBOX".into(),
            target_mailbox: "Archive".into(),
        }
    }

    fn message(uid: u32, flags: Vec<Flag>) -> Message {
        Message {
            uid,
            flags,
            internal_date: None,
            body: format!("Subject: {uid}\r\n\r\n").into_bytes(),
        }
    }

    #[tokio::test]
    async fn moves_every_message() {
        let mut source = FakeSource::new(vec![
            message(1, vec![Flag::Seen]),
            message(2, vec![Flag::Flagged, Flag::Recent]),
            message(3, vec![]),
        ]);
        let mut target = FakeTarget::default();
        let stored = AtomicU64::new(0);

        let summary = run(&mut source, &mut target, &params(), &stored)
            .await
            .unwrap();

        assert_eq!(
            summary,
            Summary {
                fetched: 3,
                stored: 3,
                ignored: 0,
                deleted: 3
            }
        );
        assert_eq!(stored.load(Ordering::Relaxed), 3);
        assert_eq!(source.marked.to_string(), "1:3");
        assert_eq!(target.selected.as_deref(), Some("Archive"));

        let flags: Vec<_> = target.appended.iter().map(|m| m.flags.clone()).collect();
        assert_eq!(flags, [vec![], vec![Flag::Flagged], vec![]]);
    }

    #[tokio::test]
    async fn skips_deleted_messages() {
        let mut source = FakeSource::new(vec![
            message(1, vec![Flag::Seen]),
            message(2, vec![Flag::Deleted]),
        ]);
        let mut target = FakeTarget::default();
        let stored = AtomicU64::new(0);

        let summary = run(&mut source, &mut target, &params(), &stored)
            .await
            .unwrap();

        assert_eq!(summary.stored, 1);
        assert_eq!(summary.ignored, 1);
        assert_eq!(source.marked.to_string(), "1");
        assert_eq!(target.appended.len(), 1);
    }

    #[tokio::test]
    async fn empty_mailbox_does_nothing() {
        let mut source = FakeSource::new(vec![]);
        let mut target = FakeTarget::default();
        let stored = AtomicU64::new(0);

        let summary = run(&mut source, &mut target, &params(), &stored)
            .await
            .unwrap();

        assert_eq!(summary, Summary::default());
        assert_eq!(source.fetch_calls, 0);
        assert_eq!(source.mark_calls, 0);
        assert!(target.appended.is_empty());
    }

    #[tokio::test]
    async fn append_failure_keeps_failed_message_on_source() {
        let mut source = FakeSource::new((1..=3).map(|uid| message(uid, vec![])).collect());
        let mut target = FakeTarget {
            fail_on_uid: Some(2),
            ..Default::default()
        };
        let stored = AtomicU64::new(0);

        let err = run(&mut source, &mut target, &params(), &stored)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(FakeError::Append(2))));
        assert_eq!(stored.load(Ordering::Relaxed), 1);
        assert_eq!(source.marked.to_string(), "1");
        assert!(source.drained, "fetch must drain the whole response");
    }

    #[tokio::test]
    async fn target_select_failure_deletes_nothing() {
        let mut source = FakeSource::new(vec![message(1, vec![])]);
        let mut target = FakeTarget {
            fail_select: true,
            ..Default::default()
        };
        let stored = AtomicU64::new(0);

        let err = run(&mut source, &mut target, &params(), &stored)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Store(FakeError::Select)));
        assert_eq!(source.mark_calls, 0);
    }

    #[tokio::test]
    async fn examine_failure_is_a_fetch_error() {
        let mut source = FakeSource {
            fail_examine: true,
            ..FakeSource::new(vec![message(1, vec![])])
        };
        let mut target = FakeTarget::default();
        let stored = AtomicU64::new(0);

        let err = run(&mut source, &mut target, &params(), &stored)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Fetch(FakeError::Examine)));
        assert!(target.appended.is_empty());
    }

    #[tokio::test]
    async fn cleanup_failure_is_reported() {
        let mut source = FakeSource {
            fail_mark: true,
            ..FakeSource::new(vec![message(1, vec![])])
        };
        let mut target = FakeTarget::default();
        let stored = AtomicU64::new(0);

        let err = run(&mut source, &mut target, &params(), &stored)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cleanup(FakeError::Mark)));
        assert_eq!(target.appended.len(), 1);
    }
}
