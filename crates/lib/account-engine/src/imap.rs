//! The IMAP connector.

use idle_watcher::ImapLongPoll;
use imap_session::{AccessTokenProvider, SelectMode};

use crate::{Account, ConnectionError, Connector, Role};

/// Connects an account's stores over IMAP.
#[derive(Debug)]
pub struct ImapConnector<SourceTokens, TargetTokens> {
    account: Account<SourceTokens, TargetTokens>,
}

impl<SourceTokens, TargetTokens> ImapConnector<SourceTokens, TargetTokens> {
    /// Create a connector for the account.
    pub fn new(account: Account<SourceTokens, TargetTokens>) -> Self {
        Self { account }
    }

    /// The account.
    pub fn account(&self) -> &Account<SourceTokens, TargetTokens> {
        &self.account
    }
}

impl<SourceTokens, TargetTokens> Connector for ImapConnector<SourceTokens, TargetTokens>
where
    SourceTokens: AccessTokenProvider,
    TargetTokens: AccessTokenProvider,
{
    type Source = imap_session::Session;
    type Target = imap_session::Session;
    type Watch = ImapLongPoll<imap_tls::Stream>;

    fn pipeline_params(&self) -> mirror_pipeline::Params {
        mirror_pipeline::Params {
            source_mailbox: self.account.source.credentials().mailbox.encoded().to_owned(),
            target_mailbox: self.account.target.credentials().mailbox.encoded().to_owned(),
        }
    }

    async fn open_source(&self) -> Result<Self::Source, ConnectionError> {
        imap_session::open(self.account.source.credentials(), SelectMode::None)
            .await
            .map_err(|err| ConnectionError::new(Role::Source, err))
    }

    async fn open_target(&self) -> Result<Self::Target, ConnectionError> {
        imap_session::open(self.account.target.credentials(), SelectMode::None)
            .await
            .map_err(|err| ConnectionError::new(Role::Target, err))
    }

    async fn open_watch(&self) -> Result<Self::Watch, ConnectionError> {
        let session = imap_session::open(self.account.source.credentials(), SelectMode::ReadOnly)
            .await
            .map_err(|err| ConnectionError::new(Role::Watch, err))?;

        ImapLongPoll::new(session, self.account.idle_fallback)
            .await
            .map_err(|err| ConnectionError::new(Role::Watch, err))
    }

    async fn close_source(&self, session: Self::Source) -> Result<(), ConnectionError> {
        imap_session::close(session)
            .await
            .map_err(|err| ConnectionError::new(Role::Source, err))
    }

    async fn close_target(&self, session: Self::Target) -> Result<(), ConnectionError> {
        imap_session::close(session)
            .await
            .map_err(|err| ConnectionError::new(Role::Target, err))
    }
}
