//! MQTT transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the MQTT transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier.
    pub client_id: String,
    /// Base topic: commands arrive on `<base>/cmd`, responses go to `<base>/stat`.
    pub base_topic: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Optional broker credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Seconds to wait before polling again after a connection error.
    pub reconnect_delay_secs: u16,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "owbridge".to_string(),
            base_topic: "owbridge".to_string(),
            keep_alive_secs: 30,
            username: None,
            password: None,
            reconnect_delay_secs: 2,
        }
    }
}

impl MqttConfig {
    /// Topic the gateway listens on.
    #[must_use]
    pub fn command_topic(&self) -> String {
        format!("{}/cmd", self.base_topic)
    }

    /// Topic responses, warnings and beacons are published on.
    #[must_use]
    pub fn status_topic(&self) -> String {
        format!("{}/stat", self.base_topic)
    }

    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.reconnect_delay_secs))
    }
}
