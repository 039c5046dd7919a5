//! Authenticated IMAP sessions to a named mail store.
//!
//! A session is opened with [`open`] (dial, login, optional select) and must
//! be released with [`close`] by the scope that opened it.

pub mod auth;
mod mailbox;
pub mod xoauth2;

pub use auth::{AccessTokenProvider, Auth, Password, PasswordOnly};
pub use mailbox::MailboxName;

/// The effective session type.
pub type Session = async_imap::Session<imap_tls::Stream>;

/// Everything needed to reach one mailbox on one server.
#[derive(Debug, Clone)]
pub struct MailStoreCredentials<P> {
    /// Server address and TLS settings.
    pub server: imap_tls::Params,

    /// Login method.
    pub auth: Auth<P>,

    /// The mailbox to work with.
    pub mailbox: MailboxName,
}

/// Whether to select the mailbox after login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Stay in the authenticated state.
    None,

    /// `EXAMINE` the mailbox.
    ReadOnly,

    /// `SELECT` the mailbox.
    ReadWrite,
}

/// Errors returned while establishing a session.
#[derive(Debug, thiserror::Error)]
pub enum Error<TokenError> {
    /// IMAP connection error.
    #[error("connect: {0}")]
    Connect(#[source] imap_tls::Error),

    /// The bearer token could not be obtained.
    #[error("access token: {0}")]
    AccessToken(#[source] TokenError),

    /// The server rejected the login.
    #[error("login: {0}")]
    Login(#[source] async_imap::error::Error),

    /// The server rejected the bearer token.
    #[error("login: {0}")]
    XOAuth2(#[source] xoauth2::ServerError),

    /// The mailbox could not be selected.
    #[error("select {mailbox}: {source}")]
    Select {
        /// The mailbox name.
        mailbox: String,

        /// Underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },
}

/// Connect, login and optionally select the mailbox.
pub async fn open<P: AccessTokenProvider>(
    credentials: &MailStoreCredentials<P>,
    select: SelectMode,
) -> Result<Session, Error<P::Error>> {
    let MailStoreCredentials {
        server,
        auth,
        mailbox,
    } = credentials;

    let client = imap_tls::connect(server).await.map_err(Error::Connect)?;
    let mut session = auth::login(client, auth).await?;

    tracing::debug!(
        imap_host = %server.host,
        imap_user = %auth.user(),
        "logged in"
    );

    let selected = match select {
        SelectMode::None => return Ok(session),
        SelectMode::ReadOnly => session.examine(mailbox.encoded()).await,
        SelectMode::ReadWrite => session.select(mailbox.encoded()).await,
    };

    let status = selected.map_err(|source| Error::Select {
        mailbox: mailbox.to_string(),
        source,
    })?;

    tracing::debug!(
        imap_mailbox = %mailbox,
        exists = status.exists,
        read_only = matches!(select, SelectMode::ReadOnly),
        "mailbox selected"
    );

    Ok(session)
}

/// Log out and drop the session.
pub async fn close(mut session: Session) -> Result<(), async_imap::error::Error> {
    session.logout().await
}
