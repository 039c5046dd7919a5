//! The `XOAUTH2` SASL mechanism.

/// SASL mechanism name.
pub const MECHANISM: &str = "XOAUTH2";

/// Error reported by the server in the `XOAUTH2` challenge.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, thiserror::Error)]
#[error("XOAUTH2 authentication error ({status})")]
pub struct ServerError {
    /// HTTP-like status, e.g. `401`.
    pub status: String,

    /// Accepted authentication schemes.
    #[serde(default)]
    pub schemes: String,

    /// The scope the token was expected to carry.
    #[serde(default)]
    pub scope: String,
}

/// Build the client's initial response.
pub fn initial_response(user: &str, access_token: &str) -> String {
    format!("user={user}\x01auth=Bearer {access_token}\x01\x01")
}

/// Parse a non-empty server challenge.
pub fn parse_challenge(challenge: &[u8]) -> Result<ServerError, serde_json::Error> {
    serde_json::from_slice(challenge)
}

/// Authenticator that answers the first (empty) challenge with the bearer
/// token and records the server error carried by any further challenge.
pub(crate) struct Authenticator<'a> {
    /// The user to log in as.
    user: &'a str,

    /// The bearer token.
    access_token: &'a str,

    /// Slot for the error the server reports.
    server_error: &'a mut Option<ServerError>,
}

impl<'a> Authenticator<'a> {
    /// Create a new authenticator.
    pub(crate) fn new(
        user: &'a str,
        access_token: &'a str,
        server_error: &'a mut Option<ServerError>,
    ) -> Self {
        Self {
            user,
            access_token,
            server_error,
        }
    }
}

impl async_imap::Authenticator for Authenticator<'_> {
    type Response = String;

    fn process(&mut self, challenge: &[u8]) -> Self::Response {
        if challenge.is_empty() {
            return initial_response(self.user, self.access_token);
        }

        match parse_challenge(challenge) {
            Ok(error) => {
                *self.server_error = Some(error);
            }
            Err(error) => {
                tracing::debug!(%error, "unparsable XOAUTH2 challenge");
            }
        }

        // An empty response makes the server finish the exchange with NO.
        String::new()
    }
}
