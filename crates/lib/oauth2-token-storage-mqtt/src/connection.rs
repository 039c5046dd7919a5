//! One short-lived broker connection.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};

use crate::{BrokerSettings, Error, REQUEST_TIMEOUT};

const DISCONNECT_TIMEOUT: Duration = Duration::from_millis(250);

pub(crate) struct Connection {
    client: AsyncClient,
    events: EventLoop,
}

impl Connection {
    /// Connect and wait for the broker to acknowledge.
    pub(crate) async fn open(settings: &BrokerSettings) -> Result<Self, Error> {
        let mut options =
            MqttOptions::new(settings.client_id.clone(), settings.host.clone(), settings.port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);
        if let Some((username, password)) = &settings.credentials {
            options.set_credentials(username.clone(), password.clone());
        }

        let (client, events) = AsyncClient::new(options, 10);
        let mut connection = Self { client, events };

        connection
            .poll_until(REQUEST_TIMEOUT, |event| {
                matches!(event, Event::Incoming(Packet::ConnAck(_)))
            })
            .await?;

        tracing::trace!(mqtt_host = %settings.host, mqtt_port = settings.port, "connected to broker");
        Ok(connection)
    }

    /// Publish and wait for the broker to acknowledge.
    pub(crate) async fn publish(
        &mut self,
        topic: &str,
        retain: bool,
        payload: Vec<u8>,
    ) -> Result<(), Error> {
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await?;

        self.poll_until(REQUEST_TIMEOUT, |event| {
            matches!(event, Event::Incoming(Packet::PubAck(_)))
        })
        .await
    }

    /// Subscribe and return the first message on the topic, or `None` if
    /// nothing arrives within `wait`.
    pub(crate) async fn retained(
        &mut self,
        topic: &str,
        wait: Duration,
    ) -> Result<Option<Vec<u8>>, Error> {
        self.client.subscribe(topic, QoS::AtMostOnce).await?;

        let received = tokio::time::timeout(wait, async {
            loop {
                if let Event::Incoming(Packet::Publish(publish)) = self.events.poll().await?
                    && publish.topic == topic
                {
                    return Ok::<_, Error>(publish.payload.to_vec());
                }
            }
        })
        .await;

        match received {
            Ok(payload) => payload.map(Some),
            Err(_elapsed) => Ok(None),
        }
    }

    /// Disconnect, giving the broker a short moment to see it.
    pub(crate) async fn close(mut self) {
        if let Err(err) = self.client.disconnect().await {
            tracing::debug!(error = %err, "unable to queue MQTT disconnect");
            return;
        }

        let _ = self
            .poll_until(DISCONNECT_TIMEOUT, |event| {
                matches!(event, Event::Outgoing(Outgoing::Disconnect))
            })
            .await;
    }

    async fn poll_until(
        &mut self,
        timeout: Duration,
        done: impl Fn(&Event) -> bool,
    ) -> Result<(), Error> {
        let polled = tokio::time::timeout(timeout, async {
            loop {
                let event = self.events.poll().await?;
                if done(&event) {
                    return Ok::<_, Error>(());
                }
            }
        })
        .await;

        polled.map_err(|_elapsed| Error::Timeout(timeout))?
    }
}
