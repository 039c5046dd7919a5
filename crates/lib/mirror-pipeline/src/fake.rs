//! In-memory stores for exercising the pipeline.

use crate::{Message, Outlet, SourceStore, TargetStore, UidSet};

/// Failures injected by the fakes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FakeError {
    /// `EXAMINE` failed.
    #[error("examine failed")]
    Examine,

    /// `SELECT` failed.
    #[error("select failed")]
    Select,

    /// `APPEND` of the given UID failed.
    #[error("append of {0} failed")]
    Append(u32),

    /// `UID STORE` failed.
    #[error("store flags failed")]
    Mark,
}

/// A source mailbox held in memory.
#[derive(Debug, Default)]
pub struct FakeSource {
    /// Messages in the mailbox.
    pub messages: Vec<Message>,

    /// UIDs marked as deleted so far.
    pub marked: UidSet,

    /// Whether the last fetch read every message.
    pub drained: bool,

    /// Number of `fetch_all` calls.
    pub fetch_calls: usize,

    /// Number of `mark_deleted` calls.
    pub mark_calls: usize,

    /// Fail `examine`.
    pub fail_examine: bool,

    /// Fail `mark_deleted`.
    pub fail_mark: bool,
}

impl FakeSource {
    /// A source holding the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }
}

impl SourceStore for FakeSource {
    type Error = FakeError;

    async fn examine(&mut self, _mailbox: &str) -> Result<u32, Self::Error> {
        if self.fail_examine {
            return Err(FakeError::Examine);
        }
        Ok(u32::try_from(self.messages.len()).unwrap_or(u32::MAX))
    }

    async fn fetch_all(&mut self, count: u32, outlet: &mut Outlet) -> Result<(), Self::Error> {
        self.fetch_calls += 1;
        self.drained = false;

        let count = usize::try_from(count).unwrap_or(usize::MAX);
        for message in self.messages.iter().take(count) {
            outlet.push(message.clone()).await;
        }

        self.drained = true;
        Ok(())
    }

    async fn select(&mut self, _mailbox: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn mark_deleted(&mut self, uids: &UidSet) -> Result<(), Self::Error> {
        self.mark_calls += 1;
        if self.fail_mark {
            return Err(FakeError::Mark);
        }
        for uid in uids.iter() {
            self.marked.insert(uid);
        }
        Ok(())
    }
}

/// A target mailbox held in memory.
#[derive(Debug, Default)]
pub struct FakeTarget {
    /// The selected mailbox.
    pub selected: Option<String>,

    /// Messages appended so far.
    pub appended: Vec<Message>,

    /// Fail `select`.
    pub fail_select: bool,

    /// Fail the append of the message with this UID.
    pub fail_on_uid: Option<u32>,
}

impl TargetStore for FakeTarget {
    type Error = FakeError;

    async fn select(&mut self, mailbox: &str) -> Result<(), Self::Error> {
        if self.fail_select {
            return Err(FakeError::Select);
        }
        self.selected = Some(mailbox.to_owned());
        Ok(())
    }

    async fn append(&mut self, _mailbox: &str, message: &Message) -> Result<(), Self::Error> {
        if self.fail_on_uid == Some(message.uid) {
            return Err(FakeError::Append(message.uid));
        }
        self.appended.push(message.clone());
        Ok(())
    }
}
