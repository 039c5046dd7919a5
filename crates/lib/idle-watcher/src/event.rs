//! Mailbox events observed on the watch session.

use async_imap::imap_proto::{MailboxDatum, Response};
use async_imap::types::UnsolicitedResponse;

/// What the server reported about the watched mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxEvent {
    /// The message count changed (`EXISTS` / `RECENT`), or a periodic check
    /// is due.
    MailboxChanged,

    /// Flags of a message changed (`FETCH`).
    MessageChanged,

    /// A message was expunged.
    Expunged,

    /// A `STATUS` report.
    Status,

    /// Anything else.
    Other,
}

impl MailboxEvent {
    /// Whether the event asks for a mirroring cycle.
    pub fn is_trigger(&self) -> bool {
        matches!(self, MailboxEvent::MailboxChanged)
    }

    /// Classify a parsed server response.
    pub fn from_response(response: &Response<'_>) -> Self {
        match response {
            Response::MailboxData(MailboxDatum::Exists(_) | MailboxDatum::Recent(_)) => {
                MailboxEvent::MailboxChanged
            }
            Response::MailboxData(MailboxDatum::Status { .. }) => MailboxEvent::Status,
            Response::Fetch { .. } => MailboxEvent::MessageChanged,
            Response::Expunge(_) => MailboxEvent::Expunged,
            _ => MailboxEvent::Other,
        }
    }

    /// Classify a response queued on the session outside a command.
    pub fn from_unsolicited(response: &UnsolicitedResponse) -> Self {
        match response {
            UnsolicitedResponse::Exists(_) | UnsolicitedResponse::Recent(_) => {
                MailboxEvent::MailboxChanged
            }
            UnsolicitedResponse::Expunge(_) => MailboxEvent::Expunged,
            UnsolicitedResponse::Other(data) => Self::from_response(data.parsed()),
            _ => MailboxEvent::Other,
        }
    }
}

impl std::fmt::Display for MailboxEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MailboxEvent::MailboxChanged => "mailbox changed",
            MailboxEvent::MessageChanged => "message changed",
            MailboxEvent::Expunged => "expunged",
            MailboxEvent::Status => "status",
            MailboxEvent::Other => "other",
        })
    }
}
