//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `owbridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashSet;

use owbridge_adapter_mqtt::MqttConfig;
use owbridge_adapter_virtual::{VirtualBusConfig, VirtualDeviceConfig};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Broker connection and topics.
    pub mqtt: MqttConfig,
    /// Command handling settings.
    pub gateway: GatewayConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Configured 1-Wire devices.
    pub devices: Vec<VirtualDeviceConfig>,
    /// Simulated bus timing.
    pub bus: VirtualBusConfig,
}

/// Command handling configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Commands that may wait for the dispatcher before new ones are refused.
    pub queue_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `owbridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("owbridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("OWBRIDGE_BROKER_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("OWBRIDGE_BROKER_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.broker_port = port;
            }
        }
        if let Ok(val) = std::env::var("OWBRIDGE_TOPIC") {
            self.mqtt.base_topic = val;
        }
        if let Ok(val) = std::env::var("OWBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "broker port must be non-zero".to_string(),
            ));
        }
        if self.mqtt.base_topic.is_empty() {
            return Err(ConfigError::Validation(
                "base topic must not be empty".to_string(),
            ));
        }
        if self.gateway.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "queue capacity must be non-zero".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for device in &self.devices {
            if !seen.insert(device.device_id) {
                return Err(ConfigError::Validation(format!(
                    "device {} configured twice",
                    device.device_id
                )));
            }
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "owbridged=info,owbridge=info,rumqttc=warn".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.mqtt.broker_host, "localhost");
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.mqtt.base_topic, "owbridge");
        assert_eq!(config.gateway.queue_capacity, 100);
        assert_eq!(config.bus.conversion_ms, 750);
        assert!(config.devices.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let toml = "";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.mqtt.broker_port, 1883);
        assert_eq!(config.gateway.queue_capacity, 100);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [mqtt]
            broker_host = 'broker.local'
            broker_port = 8883
            client_id = 'cellar'
            base_topic = 'home/cellar'
            keep_alive_secs = 10
            username = 'gateway'
            password = 'secret'

            [gateway]
            queue_capacity = 16

            [logging]
            filter = 'debug'

            [bus]
            conversion_ms = 94

            [[devices]]
            device_id = '28.FF4516130100'
            channel = 3
            temperature = 21.5

            [[devices]]
            device_id = '26.00000A1B2C3D'
            present = false
            vad = 2.1
            vdd = 5.0
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.mqtt.broker_host, "broker.local");
        assert_eq!(config.mqtt.broker_port, 8883);
        assert_eq!(config.mqtt.client_id, "cellar");
        assert_eq!(config.mqtt.command_topic(), "home/cellar/cmd");
        assert_eq!(config.mqtt.keep_alive_secs, 10);
        assert_eq!(config.mqtt.username.as_deref(), Some("gateway"));
        assert_eq!(config.mqtt.password.as_deref(), Some("secret"));
        assert_eq!(config.gateway.queue_capacity, 16);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.bus.conversion_ms, 94);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].channel, 3);
        assert_eq!(config.devices[0].temperature, Some(21.5));
        assert!(!config.devices[1].present);
        assert_eq!(config.devices[1].vdd, Some(5.0));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.mqtt.broker_port, 1883);
    }

    #[test]
    fn should_report_parse_error_for_invalid_device_id() {
        let toml = "
            [[devices]]
            device_id = 'not-an-address'
        ";
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_accept_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.mqtt.broker_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_base_topic() {
        let mut config = Config::default();
        config.mqtt.base_topic = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_queue_capacity() {
        let mut config = Config::default();
        config.gateway.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_duplicate_devices() {
        let toml = "
            [[devices]]
            device_id = '28.FF4516130100'

            [[devices]]
            device_id = '28.ff4516130100'
            channel = 1
        ";
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "invalid configuration: device 28.FF4516130100 configured twice"
        );
    }
}
