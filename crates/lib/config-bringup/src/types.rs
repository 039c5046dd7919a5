//! Resolved config types.

use std::sync::Arc;
use std::time::Duration;

/// The token provider of an OAuth 2 mail store.
pub type Tokens = Arc<
    oauth2_session::TokenSource<
        oauth2_token_storage_mqtt::MqttTokenStorage,
        oauth2_session::OAuth2Server,
    >,
>;

/// A fully resolved account.
pub type Account = account_engine::Account<Tokens, Tokens>;

/// Restart policy for failed account runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supervision {
    /// Whether to restart a failed run at all.
    pub restart: bool,

    /// Delay before the first restart.
    pub initial_backoff: Duration,

    /// Upper bound of the restart delay.
    pub max_backoff: Duration,

    /// A run lasting this long resets the restart delay.
    pub healthy_after: Duration,
}

/// Everything the process needs to start the accounts.
#[derive(Debug)]
pub struct Bringup {
    /// The accounts, in config order.
    pub accounts: Vec<Account>,

    /// Restart policy.
    pub supervision: Supervision,
}
