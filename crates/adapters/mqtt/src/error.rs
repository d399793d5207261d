//! MQTT adapter error types.

use owbridge_domain::error::GatewayError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The last-will beacon could not be encoded.
    #[error("failed to encode MQTT payload")]
    Encode(#[source] serde_json::Error),
}

impl From<MqttError> for GatewayError {
    fn from(err: MqttError) -> Self {
        match err {
            MqttError::Encode(err) => Self::Encode(err),
            other => Self::Transport(Box::new(other)),
        }
    }
}
