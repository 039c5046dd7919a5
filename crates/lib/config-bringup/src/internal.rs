//! Internal utils.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use oauth2_session::{OAuth2Server, Providers, TokenSource};
use oauth2_token_storage_mqtt::{Broker, BrokerSettings, MqttTokenStorage};

use crate::*;

/// Default MQTT port when not specified in config.
const DEFAULT_MQTT_PORT: u16 = 1883;

/// Default MQTT client identifier when not specified in config.
const DEFAULT_MQTT_CLIENT_ID: &str = "mailmirror";

/// Merge the configured providers over the built-in ones.
pub fn providers(
    configured: &HashMap<String, config_core::OAuth2ProviderConfig>,
    mut providers: Providers,
) -> Providers {
    for (name, config) in configured {
        providers.insert(
            name.clone(),
            oauth2_session::Provider {
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                device_authorization_url: config.device_authorization_url.clone(),
                token_url: config.token_url.clone(),
                scopes: config.scopes.clone(),
            },
        );
    }
    providers
}

/// Build a client for every provider.
pub fn oauth2_servers(
    providers: &Providers,
    http_client: &reqwest::Client,
) -> Result<HashMap<String, OAuth2Server>, ConfigError> {
    providers
        .iter()
        .map(|(name, provider)| {
            OAuth2Server::new(provider, http_client.clone())
                .map(|server| (name.clone(), server))
                .map_err(|source| ConfigError::Provider {
                    name: name.clone(),
                    source,
                })
        })
        .collect()
}

/// Bringup the broker handle.
pub fn broker(mqtt: &config_core::MqttConfig) -> Broker {
    let credentials = mqtt
        .username
        .clone()
        .map(|username| (username, mqtt.password.clone().unwrap_or_default()));

    Broker::new(BrokerSettings {
        host: mqtt.host.clone(),
        port: mqtt.port.unwrap_or(DEFAULT_MQTT_PORT),
        client_id: mqtt
            .client_id
            .clone()
            .unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_owned()),
        credentials,
    })
}

/// Token sources shared by the stores of one account that use the same
/// provider.
pub struct TokenSources {
    /// Clients by provider name.
    pub servers: HashMap<String, OAuth2Server>,

    /// The broker, if configured.
    pub broker: Option<Broker>,

    /// Already built token sources by provider and account name.
    pub cache: HashMap<(String, String), Tokens>,
}

impl TokenSources {
    /// The token source of the `account` at `provider`.
    pub fn get(
        &mut self,
        provider: &str,
        account: &str,
        side: &'static str,
    ) -> Result<Tokens, MailStoreError> {
        let key = (provider.to_owned(), account.to_owned());
        if let Some(tokens) = self.cache.get(&key) {
            return Ok(Arc::clone(tokens));
        }

        let server = self
            .servers
            .get(provider)
            .ok_or_else(|| MailStoreError::UnknownProvider {
                side,
                name: provider.to_owned(),
            })?;
        let broker = self
            .broker
            .as_ref()
            .ok_or(MailStoreError::MissingMqtt { side })?;

        let storage = MqttTokenStorage::new(broker.clone(), account);
        let tokens = Arc::new(TokenSource::new(storage, server.clone()));
        self.cache.insert(key, Arc::clone(&tokens));

        Ok(tokens)
    }
}

/// Bringup the server address.
pub fn server(store: &config_core::MailStoreConfig) -> imap_tls::Params {
    let tls_mode = match store.tls.mode {
        config_core::TlsMode::Implicit => imap_tls::TlsMode::Implicit,
        config_core::TlsMode::StartTls => imap_tls::TlsMode::StartTls,
    };

    imap_tls::Params {
        host: store.host.clone(),
        port: store.port.unwrap_or(tls_mode.default_port()),
        tls_mode,
        tls_server_name: store
            .tls
            .server_name
            .clone()
            .unwrap_or_else(|| store.host.clone()),
    }
}

/// Bringup one mail store.
pub fn mail_store(
    account: &str,
    store: &config_core::MailStoreConfig,
    side: &'static str,
    token_sources: &mut TokenSources,
) -> Result<imap_session::MailStoreCredentials<Tokens>, MailStoreError> {
    let auth = match &store.auth {
        config_core::Auth::Password(password) => imap_session::Auth::Password {
            username: store.username.clone(),
            password: imap_session::Password::new(password.clone()),
        },
        config_core::Auth::OAuth2(oauth2) => imap_session::Auth::OAuth2 {
            user: store.username.clone(),
            tokens: token_sources.get(&oauth2.provider, account, side)?,
        },
    };

    Ok(imap_session::MailStoreCredentials {
        server: server(store),
        auth,
        mailbox: imap_session::MailboxName::new(store.mailbox.clone()),
    })
}

/// Bringup one account.
pub fn account(
    config: &config_core::AccountConfig,
    token_sources: &mut TokenSources,
) -> Result<Account, MailStoreError> {
    Ok(Account {
        name: config.name.clone(),
        source: account_engine::Source(mail_store(
            &config.name,
            &config.source,
            "source",
            token_sources,
        )?),
        target: account_engine::Target(mail_store(
            &config.name,
            &config.target,
            "target",
            token_sources,
        )?),
        idle_fallback: Duration::from_secs(config.idle_fallback_secs.unwrap_or(0)),
    })
}

/// Bringup the restart policy.
pub fn supervision(config: &config_core::SupervisionConfig) -> Supervision {
    Supervision {
        restart: config.restart,
        initial_backoff: Duration::from_secs(config.initial_backoff_secs),
        max_backoff: Duration::from_secs(config.max_backoff_secs),
        healthy_after: Duration::from_secs(config.healthy_after_secs),
    }
}
