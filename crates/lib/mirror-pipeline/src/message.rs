//! Messages in transit between the stores.

use chrono::{DateTime, FixedOffset};

/// A message flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `\Seen`
    Seen,
    /// `\Answered`
    Answered,
    /// `\Flagged`
    Flagged,
    /// `\Deleted`
    Deleted,
    /// `\Draft`
    Draft,
    /// `\Recent`
    Recent,
    /// Any other flag or keyword, verbatim.
    Keyword(String),
}

impl Flag {
    /// Flags that describe the state of a message on one server only and
    /// are not carried over to the target.
    pub fn is_volatile(&self) -> bool {
        matches!(self, Flag::Seen | Flag::Recent)
    }

    /// The flag as written on the wire.
    pub fn as_imap(&self) -> &str {
        match self {
            Flag::Seen => "\\Seen",
            Flag::Answered => "\\Answered",
            Flag::Flagged => "\\Flagged",
            Flag::Deleted => "\\Deleted",
            Flag::Draft => "\\Draft",
            Flag::Recent => "\\Recent",
            Flag::Keyword(keyword) => keyword,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_imap())
    }
}

/// A message fetched from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// UID on the source.
    pub uid: u32,

    /// Flags as reported by the source.
    pub flags: Vec<Flag>,

    /// The internal date on the source, if reported.
    pub internal_date: Option<DateTime<FixedOffset>>,

    /// The full RFC 5322 content.
    pub body: Vec<u8>,
}

impl Message {
    /// Whether the message already carries `\Deleted` on the source.
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(&Flag::Deleted)
    }

    /// The message as it is appended to the target: volatile flags removed,
    /// everything else kept.
    pub fn into_forwarded(mut self) -> Self {
        self.flags.retain(|flag| !flag.is_volatile());
        self
    }

    /// The flag list for `APPEND`, or `None` when there are no flags.
    pub fn imap_flags(&self) -> Option<String> {
        if self.flags.is_empty() {
            return None;
        }

        let flags: Vec<&str> = self.flags.iter().map(Flag::as_imap).collect();
        Some(format!("({})", flags.join(" ")))
    }

    /// The internal date for `APPEND` as a quoted IMAP date-time.
    pub fn imap_internal_date(&self) -> Option<String> {
        self.internal_date
            .map(|date| format!("\"{}\"", date.format("%d-%b-%Y %H:%M:%S %z")))
    }
}
