//! OAuth 2 session crate.
//!
//! [`TokenSource`] hands out live access tokens for `XOAUTH2` logins. The
//! token is never held in memory between calls: it is loaded from the
//! backend, obtained through the device authorization grant when absent,
//! refreshed when close to expiry, and saved back on every call.

use std::time::Duration;

use oauth2_token_storage_core::{Token, TokenBackend};

mod provider;
mod server;

pub use provider::{Provider, Providers, builtin};
pub use server::{AuthorizationServer, ClientError, OAuth2Client, OAuth2Server, ServerError};

/// Refresh tokens that expire within this margin.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(10);

/// An error that can occur while getting a token.
#[derive(Debug, thiserror::Error)]
pub enum Error<BackendError, ServerError> {
    /// Loading the token from the backend failed.
    #[error("unable to load token from storage: {0}")]
    Load(#[source] BackendError),

    /// Requesting a device code failed.
    #[error("unable to start device authorization: {0}")]
    DeviceAuthorization(#[source] ServerError),

    /// Presenting the device code to the user failed.
    #[error("unable to notify about device authorization: {0}")]
    Notify(#[source] BackendError),

    /// The device code was not approved.
    #[error("unable to complete device authorization: {0}")]
    DeviceAccessToken(#[source] ServerError),

    /// Exchanging the refresh token failed.
    #[error("unable to refresh token: {0}")]
    Refresh(#[source] ServerError),

    /// The token is expired and cannot be refreshed.
    #[error("token expired and no refresh token is available")]
    Expired,

    /// Saving the token to the backend failed.
    #[error("unable to store token: {0}")]
    Save(#[source] BackendError),
}

/// Produces live tokens for one account.
#[derive(Debug)]
pub struct TokenSource<Backend, Server> {
    /// Where the token is cached and prompts are sent.
    pub backend: Backend,

    /// The authorization server.
    pub server: Server,

    /// If the token expires in less than this duration - refresh it.
    pub refresh_margin: Duration,
}

impl<Backend, Server> TokenSource<Backend, Server>
where
    Backend: TokenBackend,
    Server: AuthorizationServer,
{
    /// Create a token source with the default refresh margin.
    pub fn new(backend: Backend, server: Server) -> Self {
        Self {
            backend,
            server,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    /// Get a live token, authorizing or refreshing as needed.
    pub async fn token(&self) -> Result<Token, Error<Backend::Error, Server::Error>> {
        let cached = self.backend.load().await.map_err(Error::Load)?;

        let token = match cached {
            Some(token) => token,
            None => self.authorize().await?,
        };

        let token = self.renew(token).await?;

        self.backend.save(&token).await.map_err(Error::Save)?;

        Ok(token)
    }

    async fn authorize(&self) -> Result<Token, Error<Backend::Error, Server::Error>> {
        let (challenge, pending) = self
            .server
            .request_device_code()
            .await
            .map_err(Error::DeviceAuthorization)?;

        tracing::info!(
            verification_uri = %challenge.verification_uri,
            user_code = %challenge.user_code,
            "device authorization required"
        );

        self.backend
            .notify(&challenge)
            .await
            .map_err(Error::Notify)?;

        let token = self
            .server
            .exchange_device_code(pending)
            .await
            .map_err(Error::DeviceAccessToken)?;

        tracing::info!("device authorization completed");

        Ok(token)
    }

    async fn renew(&self, token: Token) -> Result<Token, Error<Backend::Error, Server::Error>> {
        if !token.expires_within(self.refresh_margin, chrono::Utc::now()) {
            return Ok(token);
        }

        let Some(refresh_token) = token.refresh_token else {
            return Err(Error::Expired);
        };

        tracing::debug!(expiry = ?token.expiry, "refreshing token");

        let mut renewed = self
            .server
            .refresh(&refresh_token)
            .await
            .map_err(Error::Refresh)?;

        if renewed.refresh_token.is_none() {
            renewed.refresh_token = Some(refresh_token);
        }

        if !renewed.is_live(chrono::Utc::now()) {
            return Err(Error::Expired);
        }

        Ok(renewed)
    }
}

impl<Backend, Server> imap_session::AccessTokenProvider for TokenSource<Backend, Server>
where
    Backend: TokenBackend,
    Server: AuthorizationServer,
{
    type Error = Error<Backend::Error, Server::Error>;

    async fn access_token(&self) -> Result<String, Self::Error> {
        self.token().await.map(|token| token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use oauth2_token_storage_core::DeviceAuthChallenge;
    use oauth2_token_storage_core::memory::MemoryBackend;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("server refused")]
    struct Refused;

    #[derive(Default)]
    struct FakeServer {
        device_requests: AtomicUsize,
        exchanges: AtomicUsize,
        refreshes: Mutex<Vec<String>>,
        issued: Option<Token>,
        refreshed: Option<Token>,
    }

    impl AuthorizationServer for FakeServer {
        type Pending = u32;
        type Error = Refused;

        async fn request_device_code(&self) -> Result<(DeviceAuthChallenge, u32), Refused> {
            self.device_requests.fetch_add(1, Ordering::SeqCst);
            let challenge = DeviceAuthChallenge {
                verification_uri: "https://example.com/device".into(),
                user_code: "WXYZ".into(),
            };
            Ok((challenge, 7))
        }

        async fn exchange_device_code(&self, pending: u32) -> Result<Token, Refused> {
            assert_eq!(pending, 7);
            self.exchanges.fetch_add(1, Ordering::SeqCst);
            self.issued.clone().ok_or(Refused)
        }

        async fn refresh(&self, refresh_token: &str) -> Result<Token, Refused> {
            self.refreshes.lock().unwrap().push(refresh_token.to_owned());
            self.refreshed.clone().ok_or(Refused)
        }
    }

    fn token(access: &str, refresh: Option<&str>, expires_in_secs: i64) -> Token {
        Token {
            access_token: access.into(),
            token_type: "Bearer".into(),
            refresh_token: refresh.map(Into::into),
            expiry: Some(chrono::Utc::now() + chrono::Duration::seconds(expires_in_secs)),
        }
    }

    #[tokio::test]
    async fn cached_token_skips_device_flow() {
        let cached = token("cached", Some("r1"), 3600);
        let source = TokenSource::new(
            MemoryBackend::with_token(cached.clone()),
            FakeServer::default(),
        );

        let got = source.token().await.unwrap();

        assert_eq!(got, cached);
        assert_eq!(source.server.device_requests.load(Ordering::SeqCst), 0);
        assert!(source.backend.notifications.lock().unwrap().is_empty());
        assert_eq!(source.backend.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_token_runs_device_flow() {
        let issued = token("fresh", Some("r1"), 3600);
        let source = TokenSource::new(
            MemoryBackend::default(),
            FakeServer {
                issued: Some(issued.clone()),
                ..Default::default()
            },
        );

        let got = source.token().await.unwrap();

        assert_eq!(got, issued);
        assert_eq!(source.server.device_requests.load(Ordering::SeqCst), 1);
        assert_eq!(source.server.exchanges.load(Ordering::SeqCst), 1);
        assert_eq!(
            source.backend.notifications.lock().unwrap().as_slice(),
            [DeviceAuthChallenge {
                verification_uri: "https://example.com/device".into(),
                user_code: "WXYZ".into(),
            }]
        );
        assert_eq!(source.backend.cached(), Some(issued));
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed_keeping_refresh_token() {
        let source = TokenSource::new(
            MemoryBackend::with_token(token("old", Some("r1"), 5)),
            FakeServer {
                refreshed: Some(token("new", None, 3600)),
                ..Default::default()
            },
        );

        let got = source.token().await.unwrap();

        assert_eq!(got.access_token, "new");
        assert_eq!(got.refresh_token.as_deref(), Some("r1"));
        assert_eq!(*source.server.refreshes.lock().unwrap(), ["r1"]);
        assert_eq!(source.backend.cached(), Some(got));
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_fails() {
        let source = TokenSource::new(
            MemoryBackend::with_token(token("old", None, -60)),
            FakeServer::default(),
        );

        let err = source.token().await.unwrap_err();

        assert!(matches!(err, Error::Expired));
        assert_eq!(source.backend.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refreshed_but_expired_token_is_not_returned() {
        let source = TokenSource::new(
            MemoryBackend::with_token(token("old", Some("r1"), -60)),
            FakeServer {
                refreshed: Some(token("stale", Some("r2"), -1)),
                ..Default::default()
            },
        );

        let err = source.token().await.unwrap_err();
        assert!(matches!(err, Error::Expired));
    }

    #[tokio::test]
    async fn load_errors_propagate() {
        let source = TokenSource::new(
            MemoryBackend {
                fail_load: true,
                ..Default::default()
            },
            FakeServer::default(),
        );

        let err = source.token().await.unwrap_err();

        assert!(matches!(err, Error::Load(_)));
        assert_eq!(source.server.device_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_exchange_caches_nothing() {
        let source = TokenSource::new(MemoryBackend::default(), FakeServer::default());

        let err = source.token().await.unwrap_err();

        assert!(matches!(err, Error::DeviceAccessToken(Refused)));
        assert_eq!(source.backend.cached(), None);
    }
}
