//! The MQTT session: connection options, event loop and inbound routing.

use std::future::Future;
use std::time::Duration;

use owbridge_domain::beacon::Beacon;
use owbridge_domain::response::Stamped;
use owbridge_domain::time;
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::mpsc;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::sink::MqttSink;

/// Capacity of the client's request channel.
const REQUEST_CAPACITY: usize = 64;

/// How long a shutdown waits for the disconnect to reach the broker.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// What the gateway does with session events.
///
/// Calls are made one at a time, in arrival order, from a task separate from
/// the event loop, so implementations may publish through the sink.
pub trait SessionHandler: Send + Sync + 'static {
    /// The broker accepted the connection. Called after every (re)connect.
    fn connected(&self) -> impl Future<Output = ()> + Send;

    /// A message arrived on the command topic.
    fn command(&self, payload: Vec<u8>) -> impl Future<Output = ()> + Send;
}

/// Connection options with an `offline` last will stamped now.
///
/// # Errors
///
/// Returns [`MqttError::Encode`] if the beacon cannot be encoded.
pub fn options(config: &MqttConfig) -> Result<MqttOptions, MqttError> {
    let mut options = MqttOptions::new(
        config.client_id.as_str(),
        config.broker_host.as_str(),
        config.broker_port,
    );
    options.set_keep_alive(config.keep_alive());
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.as_str(), password.as_str());
    }
    let offline = Stamped::new(&Beacon::OFFLINE, &time::now())
        .to_json()
        .map_err(MqttError::Encode)?;
    options.set_last_will(LastWill::new(
        config.status_topic(),
        offline.into_bytes(),
        QoS::AtLeastOnce,
        true,
    ));
    Ok(options)
}

#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Connected,
    Command(Vec<u8>),
}

/// Decide what an event loop notification means for the gateway.
fn route(event: Event, command_topic: &str) -> Option<Inbound> {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Some(Inbound::Connected),
        Event::Incoming(Packet::Publish(publish)) if publish.topic == command_topic => {
            Some(Inbound::Command(publish.payload.to_vec()))
        }
        Event::Incoming(Packet::Publish(publish)) => {
            tracing::debug!(topic = %publish.topic, "ignoring message outside the command topic");
            None
        }
        Event::Outgoing(Outgoing::Disconnect) => {
            tracing::info!("disconnected from broker");
            None
        }
        _ => None,
    }
}

/// A broker session and its event loop.
pub struct MqttSession {
    client: AsyncClient,
    eventloop: EventLoop,
    command_topic: String,
    reconnect_delay: Duration,
}

impl MqttSession {
    /// Create the client and the sink publishing through it.
    ///
    /// Nothing is sent until [`run`](Self::run) polls the event loop.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Encode`] if the last will cannot be encoded.
    pub fn new(config: &MqttConfig) -> Result<(Self, MqttSink), MqttError> {
        let (client, eventloop) = AsyncClient::new(options(config)?, REQUEST_CAPACITY);
        let sink = MqttSink::new(client.clone(), config.status_topic());
        let session = Self {
            client,
            eventloop,
            command_topic: config.command_topic(),
            reconnect_delay: config.reconnect_delay(),
        };
        Ok((session, sink))
    }

    /// Drive the connection until `shutdown` completes.
    ///
    /// Reconnects after errors and after a controlled disconnect. On every
    /// ConnAck the command topic is subscribed again before the handler is
    /// told. Once `shutdown` completes the loop keeps polling until the
    /// disconnect queued by it has been written, so anything published
    /// before is flushed.
    pub async fn run<H: SessionHandler>(mut self, handler: H, shutdown: impl Future<Output = ()>) {
        let (inbound, mut receiver) = mpsc::unbounded_channel::<Inbound>();
        let pump = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                match message {
                    Inbound::Connected => handler.connected().await,
                    Inbound::Command(payload) => handler.command(payload).await,
                }
            }
        });

        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            let event = tokio::select! {
                event = self.eventloop.poll() => event,
                () = &mut shutdown => break,
            };
            match event {
                Ok(event) => {
                    let Some(message) = route(event, &self.command_topic) else {
                        continue;
                    };
                    if message == Inbound::Connected {
                        tracing::info!(topic = %self.command_topic, "connected to broker");
                        if let Err(err) = self
                            .client
                            .try_subscribe(self.command_topic.as_str(), QoS::AtLeastOnce)
                        {
                            tracing::error!(error = %err, "failed to subscribe to command topic");
                        }
                    }
                    if inbound.send(message).is_err() {
                        tracing::error!("inbound handler stopped");
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "MQTT connection error");
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }

        drop(inbound);
        self.drain().await;
        pump.abort();
    }

    async fn drain(&mut self) {
        let flushed = tokio::time::timeout(DRAIN_TIMEOUT, async {
            loop {
                match self.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;
        if flushed.is_err() {
            tracing::warn!("timed out waiting for MQTT disconnect");
        }
        tracing::info!("MQTT session closed");
    }
}
