//! Status sink over the MQTT client.

use owbridge_app::ports::StatusSink;
use owbridge_domain::error::GatewayError;
use rumqttc::{AsyncClient, QoS};

use crate::error::MqttError;

/// Publishes on the status topic with QoS 1.
///
/// Cheap to clone: every clone shares the same client.
#[derive(Clone)]
pub struct MqttSink {
    client: AsyncClient,
    topic: String,
}

impl MqttSink {
    pub(crate) fn new(client: AsyncClient, topic: String) -> Self {
        Self { client, topic }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Close the broker connection gracefully.
    ///
    /// The broker drops the last will. The [`MqttSession`](crate::MqttSession)
    /// loop reconnects unless it is shutting down.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Client`] if the request cannot be queued.
    pub async fn disconnect(&self) -> Result<(), MqttError> {
        self.client.disconnect().await.map_err(MqttError::Client)
    }
}

impl StatusSink for MqttSink {
    async fn send(&self, payload: String, retain: bool) -> Result<(), GatewayError> {
        self.client
            .publish(self.topic.as_str(), QoS::AtLeastOnce, retain, payload.into_bytes())
            .await
            .map_err(MqttError::Client)?;
        Ok(())
    }
}
