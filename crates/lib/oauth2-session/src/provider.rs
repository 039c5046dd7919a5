//! Authorization provider table.

use std::collections::HashMap;

/// Endpoints and client registration of one authorization provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    /// The registered client id.
    pub client_id: String,

    /// The client secret, for confidential clients.
    pub client_secret: Option<String>,

    /// The device authorization endpoint.
    pub device_authorization_url: String,

    /// The token endpoint.
    pub token_url: String,

    /// Scopes to request.
    pub scopes: Vec<String>,
}

impl Provider {
    /// Microsoft identity platform, for Outlook / Exchange Online IMAP.
    pub fn microsoft() -> Self {
        Self {
            client_id: "9e5f94bc-e8a4-4e73-b8be-63364c29d753".to_owned(),
            client_secret: None,
            device_authorization_url:
                "https://login.microsoftonline.com/common/oauth2/v2.0/devicecode".to_owned(),
            token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token".to_owned(),
            scopes: vec![
                "https://outlook.office.com/IMAP.AccessAsUser.All".to_owned(),
                "offline_access".to_owned(),
            ],
        }
    }
}

/// Providers by name.
pub type Providers = HashMap<String, Provider>;

/// The providers known without configuration.
pub fn builtin() -> Providers {
    HashMap::from([("microsoft".to_owned(), Provider::microsoft())])
}
