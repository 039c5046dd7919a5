//! OAuth2 token storage interface.

use chrono::{DateTime, Utc};

mod expiry;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

/// An OAuth 2 token as it is cached.
///
/// The JSON form matches what other clients of the same broker topics
/// publish: `expiry` is RFC 3339, and a zero time reads as "no expiry".
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Token {
    /// The access token.
    pub access_token: String,

    /// The token type, usually `Bearer`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,

    /// The refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "expiry::deserialize"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    /// Whether the access token is unusable at `now` or becomes so within
    /// `margin`.
    pub fn expires_within(&self, margin: std::time::Duration, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return true;
        }

        let Some(expiry) = self.expiry else {
            return false;
        };

        let margin = chrono::Duration::from_std(margin).unwrap_or(chrono::Duration::MAX);
        match now.checked_add_signed(margin) {
            Some(deadline) => expiry <= deadline,
            None => true,
        }
    }

    /// Whether the access token is usable at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.expires_within(std::time::Duration::ZERO, now)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

/// What a human needs to approve a device authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAuthChallenge {
    /// Where to enter the code.
    pub verification_uri: String,

    /// The code to enter.
    pub user_code: String,
}

/// Abstract token storage interface, plus the channel to ask a human for
/// approval.
pub trait TokenBackend: Send + Sync {
    /// The error type of the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the cached token, if there is one.
    fn load(&self) -> impl Future<Output = Result<Option<Token>, Self::Error>> + Send;

    /// Replace the cached token.
    fn save(&self, token: &Token) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Present a device authorization challenge to the user.
    fn notify(
        &self,
        challenge: &DeviceAuthChallenge,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<T: TokenBackend> TokenBackend for std::sync::Arc<T> {
    type Error = T::Error;

    fn load(&self) -> impl Future<Output = Result<Option<Token>, Self::Error>> + Send {
        T::load(self)
    }

    fn save(&self, token: &Token) -> impl Future<Output = Result<(), Self::Error>> + Send {
        T::save(self, token)
    }

    fn notify(
        &self,
        challenge: &DeviceAuthChallenge,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        T::notify(self, challenge)
    }
}
