//! TLS dialing for IMAP clients.
//!
//! Opens the TCP connection, secures it with rustls (implicitly or through
//! `STARTTLS`) and reads the server greeting, yielding a ready
//! [`async_imap::Client`].

mod roots;

pub use roots::{ConnectorError, connector};

/// TLS stream type used for IMAP connections.
pub type Stream = tokio_rustls::client::TlsStream<tokio::net::TcpStream>;

/// The effective client type produced by [`connect`].
pub type Client = async_imap::Client<Stream>;

/// How to secure the IMAP connection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TlsMode {
    /// Implicit TLS (usually port 993).
    #[default]
    Implicit,

    /// Start with plaintext and upgrade using STARTTLS (usually port 143).
    StartTls,
}

impl TlsMode {
    /// The conventional port for this mode.
    pub const fn default_port(self) -> u16 {
        match self {
            TlsMode::Implicit => 993,
            TlsMode::StartTls => 143,
        }
    }
}

/// IMAP server address and TLS settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// Hostname or IP address of the IMAP server.
    pub host: String,

    /// IMAP port.
    pub port: u16,

    /// TLS mode.
    pub tls_mode: TlsMode,

    /// TLS server name (SNI).
    pub tls_server_name: String,
}

/// Errors returned while connecting to an IMAP server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TCP connection error.
    #[error("TCP connection error: {0}")]
    TcpConnect(#[source] std::io::Error),

    /// TLS connector setup error.
    #[error("TLS connector error: {0}")]
    Connector(#[source] ConnectorError),

    /// The TLS server name is not a valid DNS name or IP address.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),

    /// TLS handshake error.
    #[error("TLS handshake error: {0}")]
    Handshake(#[source] std::io::Error),

    /// IMAP protocol error before authentication.
    #[error("IMAP error: {0}")]
    Imap(#[source] async_imap::error::Error),

    /// The server did not send the expected greeting.
    #[error("IMAP server sent no greeting")]
    MissingGreeting,
}

/// Connect to an IMAP server and produce an unauthenticated IMAP client.
pub async fn connect(params: &Params) -> Result<Client, Error> {
    let Params {
        host,
        port,
        tls_mode,
        tls_server_name,
    } = params;

    tracing::debug!(
        imap_host = %host,
        imap_port = port,
        imap_tls_mode = ?tls_mode,
        tls_server_name = %tls_server_name,
        "connecting to an IMAP server"
    );

    let server_name = rustls::pki_types::ServerName::try_from(tls_server_name.clone())
        .map_err(|_| Error::InvalidServerName(tls_server_name.clone()))?;
    let tls_connector = connector().map_err(Error::Connector)?;

    let tcp_stream = tokio::net::TcpStream::connect((host.as_str(), *port))
        .await
        .map_err(Error::TcpConnect)?;

    let client = match tls_mode {
        TlsMode::Implicit => {
            let stream = tls_connector
                .connect(server_name, tcp_stream)
                .await
                .map_err(Error::Handshake)?;
            let mut client = async_imap::Client::new(stream);
            read_greeting(&mut client).await?;
            client
        }
        TlsMode::StartTls => {
            let mut client = async_imap::Client::new(tcp_stream);
            read_greeting(&mut client).await?;
            client
                .run_command_and_check_ok("STARTTLS", None)
                .await
                .map_err(Error::Imap)?;
            let tcp_stream = client.into_inner();
            let stream = tls_connector
                .connect(server_name, tcp_stream)
                .await
                .map_err(Error::Handshake)?;
            async_imap::Client::new(stream)
        }
    };

    Ok(client)
}

/// Wait for the untagged server greeting.
async fn read_greeting<S>(client: &mut async_imap::Client<S>) -> Result<(), Error>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    client
        .read_response()
        .await
        .ok_or(Error::MissingGreeting)?
        .map_err(|err| Error::Imap(err.into()))?;
    Ok(())
}
