//! Shared configuration types for mailmirror.

use std::collections::HashMap;

/// Root configuration.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Log filter settings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub logging: LoggingConfig,

    /// Restart policy for failed account runs.
    #[cfg_attr(feature = "serde", serde(default))]
    pub supervision: SupervisionConfig,

    /// The broker used for token storage and notifications.
    pub mqtt: Option<MqttConfig>,

    /// OAuth 2 providers, merged over the built-in ones.
    #[cfg_attr(feature = "serde", serde(default))]
    pub oauth2_providers: HashMap<String, OAuth2ProviderConfig>,

    /// Source/target pairs to mirror.
    pub accounts: Vec<AccountConfig>,
}

/// Logging configuration.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, used when `RUST_LOG` is not set.
    pub filter: Option<String>,
}

/// Restart policy for failed account runs.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisionConfig {
    /// Whether to restart a failed run at all.
    pub restart: bool,

    /// Delay before the first restart (seconds).
    pub initial_backoff_secs: u64,

    /// Upper bound of the restart delay (seconds).
    pub max_backoff_secs: u64,

    /// A run lasting this long resets the restart delay (seconds).
    pub healthy_after_secs: u64,
}

impl Default for SupervisionConfig {
    fn default() -> Self {
        Self {
            restart: true,
            initial_backoff_secs: 1,
            max_backoff_secs: 300,
            healthy_after_secs: 600,
        }
    }
}

/// MQTT broker settings.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    /// Broker hostname or IP address.
    pub host: String,

    /// Optional port override.
    pub port: Option<u16>,

    /// Optional client identifier override.
    pub client_id: Option<String>,

    /// Broker username.
    pub username: Option<String>,

    /// Broker password.
    pub password: Option<String>,
}

/// OAuth 2 provider registration.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2ProviderConfig {
    /// OAuth 2 client ID.
    pub client_id: String,

    /// OAuth 2 client secret, for confidential clients.
    pub client_secret: Option<String>,

    /// OAuth 2 device authorization URL.
    pub device_authorization_url: String,

    /// OAuth 2 token URL.
    pub token_url: String,

    /// Scopes to request.
    #[cfg_attr(feature = "serde", serde(default))]
    pub scopes: Vec<String>,
}

/// One source/target pair.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Human-friendly name for logging and identification.
    pub name: String,

    /// Long-poll fallback interval (seconds); zero or absent selects the default.
    pub idle_fallback_secs: Option<u64>,

    /// Where messages are taken from.
    pub source: MailStoreConfig,

    /// Where messages are put into.
    pub target: MailStoreConfig,
}

/// A mailbox on an IMAP server.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailStoreConfig {
    /// Hostname or IP address of the IMAP server.
    pub host: String,

    /// Optional port override.
    pub port: Option<u16>,

    /// TLS settings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub tls: TlsConfig,

    /// Username, also the OAuth 2 user.
    pub username: String,

    /// Authentication settings.
    pub auth: Auth,

    /// Mailbox name (e.g. INBOX).
    pub mailbox: String,
}

/// TLS configuration for a server.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    /// TLS mode.
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: TlsMode,

    /// Optional override for the TLS server name (SNI).
    pub server_name: Option<String>,
}

/// Supported TLS modes.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum TlsMode {
    /// Implicit TLS (usually port 993).
    #[default]
    Implicit,

    /// STARTTLS upgrade (usually port 143).
    #[cfg_attr(feature = "serde", serde(rename = "starttls", alias = "start_tls"))]
    StartTls,
}

/// IMAP authentication settings.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// Login via username/password.
    Password(String),

    /// Authenticate via a managed OAuth 2 session.
    #[cfg_attr(feature = "serde", serde(rename = "oauth2"))]
    OAuth2(OAuth2Auth),
}

/// Managed OAuth 2 session settings.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Auth {
    /// Name of the OAuth 2 provider.
    pub provider: String,
}
