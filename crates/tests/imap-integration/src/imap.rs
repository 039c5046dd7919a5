//! IMAP helpers for driving the container directly.

use std::time::Duration;

use futures_util::TryStreamExt as _;
use tokio::net::TcpStream;

/// A plaintext session to the container.
pub type Session = async_imap::Session<TcpStream>;

/// How long to keep retrying while the container finishes starting.
const READY_TIMEOUT: Duration = Duration::from_secs(15);

/// Delay between connection attempts.
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// A login on the container.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// Mapped host.
    pub host: String,

    /// Mapped plain IMAP port.
    pub port: u16,

    /// Login name.
    pub user: String,

    /// Password.
    pub password: String,
}

impl Endpoint {
    /// Log in, retrying until the server accepts connections.
    pub async fn connect(&self) -> Result<Session, std::io::Error> {
        let deadline = tokio::time::Instant::now() + READY_TIMEOUT;
        loop {
            match self.try_connect().await {
                Ok(session) => return Ok(session),
                Err(err) if tokio::time::Instant::now() >= deadline => return Err(err),
                Err(_) => tokio::time::sleep(RETRY_DELAY).await,
            }
        }
    }

    async fn try_connect(&self) -> Result<Session, std::io::Error> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let mut client = async_imap::Client::new(stream);

        client
            .read_response()
            .await
            .ok_or_else(|| std::io::Error::other("missing IMAP greeting"))??;

        client
            .login(&self.user, &self.password)
            .await
            .map_err(|(err, _)| std::io::Error::other(err))
    }
}

/// The flags of every message in `mailbox`, rendered one string per
/// message in sequence order.
pub async fn mailbox_flags(
    session: &mut Session,
    mailbox: &str,
) -> Result<Vec<String>, async_imap::error::Error> {
    if session.examine(mailbox).await?.exists == 0 {
        return Ok(Vec::new());
    }

    let fetches: Vec<_> = session.fetch("1:*", "FLAGS").await?.try_collect().await?;
    Ok(fetches
        .iter()
        .map(|fetch| format!("{:?}", fetch.flags().collect::<Vec<_>>()))
        .collect())
}
