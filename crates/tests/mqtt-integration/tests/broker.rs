//! Docker-backed token storage tests.

use std::error::Error;
use std::time::{Duration, Instant};

use oauth2_token_storage_core::{DeviceAuthChallenge, Token, TokenBackend as _};
use oauth2_token_storage_mqtt::{Broker, BrokerSettings, LOAD_TIMEOUT, MqttTokenStorage};

type TestResult = Result<(), Box<dyn Error + Send + Sync>>;

struct Server {
    _container: testcontainers::ContainerAsync<testcontainers::GenericImage>,
    host: String,
    port: u16,
}

impl Server {
    async fn start() -> Result<Self, Box<dyn Error + Send + Sync>> {
        let container = mqtt_integration::start_mosquitto().await?;
        let host = container.get_host().await?.to_string();
        let port = container
            .get_host_port_ipv4(mqtt_integration::MQTT_PORT)
            .await?;

        Ok(Self {
            _container: container,
            host,
            port,
        })
    }

    fn broker(&self) -> Broker {
        Broker::new(BrokerSettings {
            host: self.host.clone(),
            port: self.port,
            client_id: "mirror".to_owned(),
            credentials: None,
        })
    }
}

fn token(access_token: &str) -> Token {
    Token {
        access_token: access_token.to_owned(),
        token_type: "Bearer".to_owned(),
        refresh_token: Some("refresh".to_owned()),
        expiry: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn load_without_retained_token_is_empty() -> TestResult {
    mqtt_integration::require_integration_tests_enabled()?;

    let server = Server::start().await?;
    let storage = MqttTokenStorage::new(server.broker(), "nobody@example.com");

    let started = Instant::now();
    let loaded = storage.load().await?;

    assert!(loaded.is_none());
    assert!(started.elapsed() >= LOAD_TIMEOUT);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn saved_token_is_loaded_by_next_run() -> TestResult {
    mqtt_integration::require_integration_tests_enabled()?;

    let server = Server::start().await?;
    MqttTokenStorage::new(server.broker(), "work")
        .save(&token("first"))
        .await?;
    MqttTokenStorage::new(server.broker(), "work")
        .save(&token("second"))
        .await?;

    let loaded = MqttTokenStorage::new(server.broker(), "work").load().await?;
    let other = MqttTokenStorage::new(server.broker(), "home").load().await?;

    let loaded = loaded.ok_or("token was not retained")?;
    assert_eq!(loaded.access_token, "second");
    assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
    assert!(other.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn notify_announces_entity_then_prompt() -> TestResult {
    mqtt_integration::require_integration_tests_enabled()?;

    let server = Server::start().await?;
    let mut observer =
        mqtt_integration::Observer::subscribe(&server.host, server.port, "homeassistant/#")
            .await?;

    MqttTokenStorage::new(server.broker(), "user@example.com")
        .notify(&DeviceAuthChallenge {
            verification_uri: "https://microsoft.com/devicelogin".to_owned(),
            user_code: "ABCD-1234".to_owned(),
        })
        .await?;

    let wait = Duration::from_secs(5);
    let (config_topic, config) = observer.next(wait).await?.ok_or("no discovery record")?;
    let (state_topic, state) = observer.next(wait).await?.ok_or("no prompt")?;

    assert_eq!(
        config_topic,
        "homeassistant/event/mirror/user-example-com/config"
    );
    let config: serde_json::Value = serde_json::from_slice(&config)?;
    assert_eq!(config["name"], "user@example.com");

    assert_eq!(state_topic, "homeassistant/event/mirror/user-example-com/state");
    let state: serde_json::Value = serde_json::from_slice(&state)?;
    assert_eq!(state["event_type"], "auth");
    assert_eq!(state["code"], "ABCD-1234");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn operations_sharing_a_client_id_take_turns() -> TestResult {
    mqtt_integration::require_integration_tests_enabled()?;

    let server = Server::start().await?;
    let broker = server.broker();
    let work = MqttTokenStorage::new(broker.clone(), "work");
    let home = MqttTokenStorage::new(broker, "home");

    let started = Instant::now();
    let (work, home) = tokio::join!(work.load(), home.load());

    assert!(work?.is_none());
    assert!(home?.is_none());
    assert!(started.elapsed() >= LOAD_TIMEOUT * 2);
    Ok(())
}
