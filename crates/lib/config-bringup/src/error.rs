//! Error types.

/// Config bringup error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No accounts are configured.
    #[error("no accounts configured")]
    NoAccounts,

    /// Two accounts share a name.
    #[error("duplicate account name \"{name}\"")]
    DuplicateAccount {
        /// The repeated name.
        name: String,
    },

    /// An OAuth 2 provider is unusable.
    #[error("oauth2 provider \"{name}\": {source}")]
    Provider {
        /// The provider name.
        name: String,

        /// Underlying error.
        #[source]
        source: oauth2_session::ClientError,
    },

    /// The HTTP client for the authorization servers could not be built.
    #[error("http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// An account is misconfigured.
    #[error("account \"{name}\": {source}")]
    Account {
        /// The account name.
        name: String,

        /// Underlying error.
        #[source]
        source: MailStoreError,
    },
}

/// Mail store bringup error.
#[derive(Debug, thiserror::Error)]
pub enum MailStoreError {
    /// The OAuth 2 provider with the given name was not found.
    #[error("{side}: oauth2 provider \"{name}\" not found")]
    UnknownProvider {
        /// Which store of the account.
        side: &'static str,

        /// The name of the provider that was missing.
        name: String,
    },

    /// OAuth 2 tokens are stored on the broker, which is not configured.
    #[error("{side}: oauth2 requires the mqtt section")]
    MissingMqtt {
        /// Which store of the account.
        side: &'static str,
    },
}
