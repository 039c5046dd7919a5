//! MQTT-based token storage implementation.
//!
//! The token lives in a retained message on a per-account topic, so any
//! later subscriber (including the next process run) gets it right away.
//! Device authorization prompts are published as a Home Assistant event
//! entity.
//!
//! Every operation opens its own broker connection and closes it again.
//! Operations sharing a [`Broker`] are serialized, since overlapping
//! sessions with one client identity kick each other off the broker.

use std::sync::Arc;
use std::time::Duration;

use oauth2_token_storage_core::{DeviceAuthChallenge, Token, TokenBackend};

mod connection;
pub mod payload;
pub mod topics;

use connection::Connection;

/// How long `load` waits for a retained token.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(1);

/// How long to wait for the broker to accept a connection or a publish.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Broker address and identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    /// Broker host.
    pub host: String,

    /// Broker port.
    pub port: u16,

    /// MQTT client identifier, also the namespace of all topics.
    pub client_id: String,

    /// Optional username and password.
    pub credentials: Option<(String, String)>,
}

/// A broker shared by all backends using the same client identity.
#[derive(Debug, Clone)]
pub struct Broker {
    settings: Arc<BrokerSettings>,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Broker {
    /// Create a broker handle; clone it to share the serialization lock.
    pub fn new(settings: BrokerSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// The broker settings.
    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Take the lock and open a fresh connection.
    ///
    /// The lock stays held until the returned guard is dropped, which must
    /// happen after the connection is closed.
    async fn connect(&self) -> Result<(tokio::sync::MutexGuard<'_, ()>, Connection), Error> {
        let guard = self.lock.lock().await;
        let connection = Connection::open(&self.settings).await?;
        Ok((guard, connection))
    }
}

/// Errors of the broker-backed storage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The broker connection failed.
    #[error("MQTT connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    /// A request could not be queued.
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// The broker did not answer in time.
    #[error("MQTT broker did not answer within {0:?}")]
    Timeout(Duration),

    /// The stored token is not valid JSON.
    #[error("token payload error: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Token storage for one account.
#[derive(Debug, Clone)]
pub struct MqttTokenStorage {
    broker: Broker,
    name: String,
    key: String,
}

impl MqttTokenStorage {
    /// Storage for the account with the given display name.
    pub fn new(broker: Broker, name: impl Into<String>) -> Self {
        let name = name.into();
        let key = topics::account_key(&name);
        Self { broker, name, key }
    }

    fn client_id(&self) -> &str {
        &self.broker.settings().client_id
    }
}

impl TokenBackend for MqttTokenStorage {
    type Error = Error;

    async fn load(&self) -> Result<Option<Token>, Self::Error> {
        let topic = topics::token(self.client_id(), &self.key);

        let (_guard, mut connection) = self.broker.connect().await?;
        let payload = connection.retained(&topic, LOAD_TIMEOUT).await;
        connection.close().await;
        let payload = payload?;

        let Some(payload) = payload.filter(|payload| !payload.is_empty()) else {
            tracing::debug!(mqtt_topic = %topic, "no retained token");
            return Ok(None);
        };

        let token = serde_json::from_slice(&payload).map_err(Error::Payload)?;
        tracing::debug!(mqtt_topic = %topic, "loaded retained token");
        Ok(Some(token))
    }

    async fn save(&self, token: &Token) -> Result<(), Self::Error> {
        let topic = topics::token(self.client_id(), &self.key);
        let payload = serde_json::to_vec(token).map_err(Error::Payload)?;

        let (_guard, mut connection) = self.broker.connect().await?;
        let published = connection.publish(&topic, true, payload).await;
        connection.close().await;
        published?;

        tracing::debug!(mqtt_topic = %topic, "saved token");
        Ok(())
    }

    async fn notify(&self, challenge: &DeviceAuthChallenge) -> Result<(), Self::Error> {
        let base = topics::event_base(self.client_id(), &self.key);
        let config = payload::discovery(&base, &self.name, self.client_id(), &self.key)
            .map_err(Error::Payload)?;
        let state = payload::auth_event(challenge).map_err(Error::Payload)?;

        let (_guard, mut connection) = self.broker.connect().await?;
        let mut published = connection
            .publish(&topics::event_config(&base), false, config)
            .await;
        if published.is_ok() {
            published = connection
                .publish(&topics::event_state(&base), false, state)
                .await;
        }
        connection.close().await;
        published?;

        tracing::info!(account = %self.name, mqtt_topic = %base, "published device authorization prompt");
        Ok(())
    }
}
