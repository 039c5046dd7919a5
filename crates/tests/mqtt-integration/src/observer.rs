//! A plain subscriber watching what reaches the broker.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Records publishes on a topic filter.
pub struct Observer {
    _client: AsyncClient,
    events: EventLoop,
}

impl Observer {
    /// Connect with its own client id and subscribe to `filter`.
    pub async fn subscribe(
        host: &str,
        port: u16,
        filter: &str,
    ) -> Result<Self, BoxError> {
        let options = MqttOptions::new("mailmirror-observer", host, port);
        let (client, mut events) = AsyncClient::new(options, 10);

        client.subscribe(filter, QoS::AtLeastOnce).await?;

        loop {
            if let Event::Incoming(Packet::SubAck(_)) = events.poll().await? {
                break;
            }
        }

        Ok(Self {
            _client: client,
            events,
        })
    }

    /// The next publish as topic and payload, or `None` once `wait` passes.
    pub async fn next(
        &mut self,
        wait: Duration,
    ) -> Result<Option<(String, Vec<u8>)>, BoxError> {
        let received = tokio::time::timeout(wait, async {
            loop {
                if let Event::Incoming(Packet::Publish(publish)) = self.events.poll().await? {
                    return Ok::<_, BoxError>((publish.topic, publish.payload.to_vec()));
                }
            }
        })
        .await;

        match received {
            Ok(publish) => publish.map(Some),
            Err(_elapsed) => Ok(None),
        }
    }
}
