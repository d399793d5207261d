//! Glue between the MQTT session and the application layer.

use std::sync::Arc;

use owbridge_adapter_mqtt::{MqttSink, SessionHandler};
use owbridge_app::context::GatewayContext;
use owbridge_app::dispatcher::CommandQueue;
use owbridge_app::ports::{OneWireBus, StatusSink, SystemControl};
use owbridge_domain::beacon::Beacon;
use owbridge_domain::error::GatewayError;

/// Announces the gateway on connect and feeds commands to the dispatcher.
pub struct GatewayHandler<B, S> {
    context: Arc<GatewayContext<B, S>>,
    queue: CommandQueue<B, S>,
}

impl<B, S> GatewayHandler<B, S> {
    pub fn new(context: Arc<GatewayContext<B, S>>, queue: CommandQueue<B, S>) -> Self {
        Self { context, queue }
    }
}

impl<B, S> SessionHandler for GatewayHandler<B, S>
where
    B: OneWireBus + 'static,
    S: StatusSink + 'static,
{
    async fn connected(&self) {
        tracing::info!("connected to broker");
        if let Err(err) = self.context.publisher().publish_beacon(Beacon::ONLINE).await {
            tracing::warn!(error = %err, "failed to publish online beacon");
        }
    }

    async fn command(&self, payload: Vec<u8>) {
        if let Err(err) = self.queue.submit(&payload).await {
            tracing::error!(error = %err, "failed to accept command");
        }
    }
}

/// Restart without leaving the process: go offline, forget every
/// subscription and drop the broker connection. The session loop
/// reconnects and [`GatewayHandler::connected`] announces `online` again.
pub struct GatewayRestart<B> {
    context: Arc<GatewayContext<B, MqttSink>>,
    sink: MqttSink,
}

impl<B> GatewayRestart<B> {
    pub fn new(context: Arc<GatewayContext<B, MqttSink>>, sink: MqttSink) -> Self {
        Self { context, sink }
    }
}

impl<B: OneWireBus> SystemControl for GatewayRestart<B> {
    async fn restart(&self) -> Result<(), GatewayError> {
        tracing::info!("restarting gateway");
        self.context.publisher().publish_beacon(Beacon::OFFLINE).await?;
        self.context.subscriptions().clear();
        self.sink.disconnect().await?;
        Ok(())
    }
}
