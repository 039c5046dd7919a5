//! The authorization server seam and its `oauth2` implementation.

use oauth2::TokenResponse as _;
use oauth2_token_storage_core::{DeviceAuthChallenge, Token};

use crate::Provider;

/// The authorization server operations the token source needs.
pub trait AuthorizationServer: Send + Sync {
    /// State carried from the device code request to the exchange.
    type Pending: Send;

    /// The error type of the server.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start a device authorization.
    fn request_device_code(
        &self,
    ) -> impl Future<Output = Result<(DeviceAuthChallenge, Self::Pending), Self::Error>> + Send;

    /// Wait for the user to approve and exchange the device code.
    fn exchange_device_code(
        &self,
        pending: Self::Pending,
    ) -> impl Future<Output = Result<Token, Self::Error>> + Send;

    /// Exchange a refresh token for a new token.
    fn refresh(&self, refresh_token: &str)
    -> impl Future<Output = Result<Token, Self::Error>> + Send;
}

/// Type alias for OAuth 2 client with device authorization and token
/// endpoints configured.
pub type OAuth2Client = oauth2::basic::BasicClient<
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointNotSet,
    oauth2::EndpointSet,
>;

type HttpError = oauth2::HttpClientError<reqwest::Error>;

/// An error building the client from a provider.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The device authorization URL is invalid.
    #[error("invalid device authorization URL: {0}")]
    DeviceAuthorizationUrl(#[source] oauth2::url::ParseError),

    /// The token URL is invalid.
    #[error("invalid token URL: {0}")]
    TokenUrl(#[source] oauth2::url::ParseError),
}

/// Errors talking to the authorization server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Requesting the device code failed.
    #[error("device authorization request failed: {0}")]
    DeviceAuthorization(
        #[source]
        oauth2::RequestTokenError<HttpError, oauth2::basic::BasicErrorResponse>,
    ),

    /// The device code exchange failed or expired.
    #[error("device access token request failed: {0}")]
    DeviceAccessToken(
        #[source] oauth2::RequestTokenError<HttpError, oauth2::DeviceCodeErrorResponse>,
    ),

    /// Exchanging the refresh token failed.
    #[error("unable to exchange refresh token: {0}")]
    ExchangeRefreshToken(
        #[source]
        oauth2::RequestTokenError<HttpError, oauth2::basic::BasicErrorResponse>,
    ),
}

/// Authorization server reached with the `oauth2` crate over `reqwest`.
#[derive(Debug, Clone)]
pub struct OAuth2Server {
    /// The OAuth2 client.
    pub oauth2_client: OAuth2Client,

    /// The HTTP client.
    pub http_client: reqwest::Client,

    /// Scopes to request.
    pub scopes: Vec<oauth2::Scope>,
}

impl OAuth2Server {
    /// Build the client for a provider.
    pub fn new(provider: &Provider, http_client: reqwest::Client) -> Result<Self, ClientError> {
        let device_authorization_url =
            oauth2::DeviceAuthorizationUrl::new(provider.device_authorization_url.clone())
                .map_err(ClientError::DeviceAuthorizationUrl)?;
        let token_url =
            oauth2::TokenUrl::new(provider.token_url.clone()).map_err(ClientError::TokenUrl)?;

        let mut oauth2_client = oauth2::basic::BasicClient::new(oauth2::ClientId::new(
            provider.client_id.clone(),
        ))
        .set_device_authorization_url(device_authorization_url)
        .set_token_uri(token_url);

        if let Some(client_secret) = &provider.client_secret {
            oauth2_client =
                oauth2_client.set_client_secret(oauth2::ClientSecret::new(client_secret.clone()));
        }

        Ok(Self {
            oauth2_client,
            http_client,
            scopes: provider
                .scopes
                .iter()
                .cloned()
                .map(oauth2::Scope::new)
                .collect(),
        })
    }
}

fn token_from_response(response: &oauth2::basic::BasicTokenResponse) -> Token {
    Token {
        access_token: response.access_token().secret().clone(),
        token_type: response.token_type().as_ref().to_owned(),
        refresh_token: response
            .refresh_token()
            .map(|refresh_token| refresh_token.secret().clone()),
        expiry: response.expires_in().and_then(|expires_in| {
            chrono::Duration::from_std(expires_in)
                .ok()
                .and_then(|expires_in| chrono::Utc::now().checked_add_signed(expires_in))
        }),
    }
}

impl AuthorizationServer for OAuth2Server {
    type Pending = oauth2::StandardDeviceAuthorizationResponse;
    type Error = ServerError;

    async fn request_device_code(
        &self,
    ) -> Result<(DeviceAuthChallenge, Self::Pending), Self::Error> {
        let details: oauth2::StandardDeviceAuthorizationResponse = self
            .oauth2_client
            .exchange_device_code()
            .add_scopes(self.scopes.iter().cloned())
            .request_async(&self.http_client)
            .await
            .map_err(ServerError::DeviceAuthorization)?;

        let challenge = DeviceAuthChallenge {
            verification_uri: details.verification_uri().to_string(),
            user_code: details.user_code().secret().clone(),
        };

        Ok((challenge, details))
    }

    async fn exchange_device_code(&self, pending: Self::Pending) -> Result<Token, Self::Error> {
        let response = self
            .oauth2_client
            .exchange_device_access_token(&pending)
            .request_async(&self.http_client, tokio::time::sleep, None)
            .await
            .map_err(ServerError::DeviceAccessToken)?;

        Ok(token_from_response(&response))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Token, Self::Error> {
        let refresh_token = oauth2::RefreshToken::new(refresh_token.to_owned());
        let response = self
            .oauth2_client
            .exchange_refresh_token(&refresh_token)
            .request_async(&self.http_client)
            .await
            .map_err(ServerError::ExchangeRefreshToken)?;

        Ok(token_from_response(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_for_builtin_provider() {
        let server = OAuth2Server::new(&Provider::microsoft(), reqwest::Client::new()).unwrap();
        assert_eq!(server.scopes.len(), 2);
    }

    #[test]
    fn rejects_invalid_urls() {
        let provider = Provider {
            token_url: "not a url".to_owned(),
            ..Provider::microsoft()
        };

        let err = OAuth2Server::new(&provider, reqwest::Client::new()).unwrap_err();
        assert!(matches!(err, ClientError::TokenUrl(_)));
    }
}
