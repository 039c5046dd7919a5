//! Error attribution.

use crate::State;

/// A boxed lower-level error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which session failed to open or close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A data transfer session to the source.
    Source,

    /// A data transfer session to the target.
    Target,

    /// The long-lived watch session to the source.
    Watch,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Source => "source",
            Role::Target => "target",
            Role::Watch => "watch",
        })
    }
}

/// A session could not be opened or released.
#[derive(Debug, thiserror::Error)]
#[error("{role} connection: {source}")]
pub struct ConnectionError {
    /// The session that failed.
    pub role: Role,

    /// Underlying error.
    #[source]
    pub source: BoxError,
}

impl ConnectionError {
    /// Wrap an error for the given role.
    pub fn new(role: Role, source: impl Into<BoxError>) -> Self {
        Self {
            role,
            source: source.into(),
        }
    }
}

/// What went wrong.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// A session could not be opened or released.
    #[error(transparent)]
    Connection(ConnectionError),

    /// Reading the source mailbox failed.
    #[error("fetch: {0}")]
    Fetch(#[source] BoxError),

    /// Appending to the target failed.
    #[error("store: {0}")]
    Store(#[source] BoxError),

    /// Marking messages as deleted on the source failed.
    #[error("cleanup: {0}")]
    Cleanup(#[source] BoxError),

    /// The watch session failed.
    #[error("watch: {0}")]
    Watch(#[source] BoxError),

    /// `watch` was called without a watch session.
    #[error("not connected")]
    NotConnected,
}

impl From<ConnectionError> for ErrorKind {
    fn from(err: ConnectionError) -> Self {
        ErrorKind::Connection(err)
    }
}

impl<SourceError, TargetError> From<mirror_pipeline::Error<SourceError, TargetError>> for ErrorKind
where
    SourceError: std::error::Error + Send + Sync + 'static,
    TargetError: std::error::Error + Send + Sync + 'static,
{
    fn from(err: mirror_pipeline::Error<SourceError, TargetError>) -> Self {
        match err {
            mirror_pipeline::Error::Fetch(err) => ErrorKind::Fetch(Box::new(err)),
            mirror_pipeline::Error::Store(err) => ErrorKind::Store(Box::new(err)),
            mirror_pipeline::Error::Cleanup(err) => ErrorKind::Cleanup(Box::new(err)),
        }
    }
}

/// An error attributed to an account and the state it happened in.
#[derive(Debug, thiserror::Error)]
#[error("account {account} ({state}): {kind}")]
pub struct AccountError {
    /// Account display name.
    pub account: String,

    /// The lifecycle state at the time of the error.
    pub state: State,

    /// What went wrong.
    #[source]
    pub kind: ErrorKind,
}
