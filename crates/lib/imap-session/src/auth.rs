//! Authentication.

/// Wrapper for sensitive passwords.
#[derive(Clone, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Create a new password wrapper.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner password value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***redacted***)")
    }
}

/// Source of bearer tokens for `XOAUTH2` logins.
pub trait AccessTokenProvider: Send + Sync {
    /// The error type of the provider.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce a live access token.
    fn access_token(&self) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

impl<T: AccessTokenProvider> AccessTokenProvider for std::sync::Arc<T> {
    type Error = T::Error;

    fn access_token(&self) -> impl Future<Output = Result<String, Self::Error>> + Send {
        T::access_token(self)
    }
}

/// Provider for mail stores that only ever log in with passwords.
#[derive(Debug, Clone, Copy)]
pub enum PasswordOnly {}

impl AccessTokenProvider for PasswordOnly {
    type Error = std::convert::Infallible;

    async fn access_token(&self) -> Result<String, Self::Error> {
        match *self {}
    }
}

/// Login method of a mail store.
#[derive(Clone)]
pub enum Auth<P> {
    /// `LOGIN` with username/password.
    Password {
        /// Username, typically an email address.
        username: String,

        /// Password.
        password: Password,
    },

    /// `AUTHENTICATE XOAUTH2` with a bearer token from the provider.
    OAuth2 {
        /// The user to authenticate as.
        user: String,

        /// Where to get the bearer token from.
        tokens: P,
    },
}

impl<P> Auth<P> {
    /// The user name presented to the server.
    pub fn user(&self) -> &str {
        match self {
            Auth::Password { username, .. } => username,
            Auth::OAuth2 { user, .. } => user,
        }
    }
}

impl<P> std::fmt::Debug for Auth<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::Password { username, password } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", password)
                .finish(),
            Auth::OAuth2 { user, .. } => f.debug_struct("OAuth2").field("user", user).finish(),
        }
    }
}

/// Authenticate the client to obtain a session.
pub(crate) async fn login<P: AccessTokenProvider>(
    client: imap_tls::Client,
    auth: &Auth<P>,
) -> Result<crate::Session, crate::Error<P::Error>> {
    match auth {
        Auth::Password { username, password } => client
            .login(username, password.as_str())
            .await
            .map_err(|(err, _client)| crate::Error::Login(err)),
        Auth::OAuth2 { user, tokens } => {
            let access_token = tokens
                .access_token()
                .await
                .map_err(crate::Error::AccessToken)?;

            let mut server_error = None;
            let result = client
                .authenticate(
                    crate::xoauth2::MECHANISM,
                    crate::xoauth2::Authenticator::new(user, &access_token, &mut server_error),
                )
                .await;

            result.map_err(|(err, _client)| match server_error.take() {
                Some(server_error) => crate::Error::XOAuth2(server_error),
                None => crate::Error::Login(err),
            })
        }
    }
}
