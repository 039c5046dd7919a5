//! Opening and releasing the sessions an account needs.

use std::time::Duration;

use idle_watcher::LongPoll;
use imap_session::MailStoreCredentials;
use mirror_pipeline::{SourceStore, TargetStore};

use crate::ConnectionError;

/// The store messages are taken from.
#[derive(Debug, Clone)]
pub struct Source<P>(pub MailStoreCredentials<P>);

/// The store messages are put into.
#[derive(Debug, Clone)]
pub struct Target<P>(pub MailStoreCredentials<P>);

impl<P> Source<P> {
    /// The credentials of the store.
    pub fn credentials(&self) -> &MailStoreCredentials<P> {
        &self.0
    }
}

impl<P> Target<P> {
    /// The credentials of the store.
    pub fn credentials(&self) -> &MailStoreCredentials<P> {
        &self.0
    }
}

/// One source/target pair.
#[derive(Debug, Clone)]
pub struct Account<SourceTokens, TargetTokens> {
    /// Display name.
    pub name: String,

    /// Where messages come from.
    pub source: Source<SourceTokens>,

    /// Where messages go.
    pub target: Target<TargetTokens>,

    /// The long-poll fallback interval; zero selects the default.
    pub idle_fallback: Duration,
}

/// Opens and releases sessions for one account.
pub trait Connector: Send + Sync {
    /// Data transfer session to the source.
    type Source: SourceStore;

    /// Data transfer session to the target.
    type Target: TargetStore;

    /// Long-lived watch session to the source.
    type Watch: LongPoll;

    /// Mailbox names for the pipeline.
    fn pipeline_params(&self) -> mirror_pipeline::Params;

    /// Open an authenticated source session.
    fn open_source(&self) -> impl Future<Output = Result<Self::Source, ConnectionError>> + Send;

    /// Open an authenticated target session.
    fn open_target(&self) -> impl Future<Output = Result<Self::Target, ConnectionError>> + Send;

    /// Open the watch session with the source mailbox selected.
    fn open_watch(&self) -> impl Future<Output = Result<Self::Watch, ConnectionError>> + Send;

    /// Release a source session.
    fn close_source(
        &self,
        session: Self::Source,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;

    /// Release a target session.
    fn close_target(
        &self,
        session: Self::Target,
    ) -> impl Future<Output = Result<(), ConnectionError>> + Send;
}
