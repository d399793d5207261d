//! # owbridge-adapter-mqtt
//!
//! MQTT transport for the gateway, built on `rumqttc`.
//!
//! ## Responsibilities
//! - Connect to the broker with a retained `offline` last will
//! - (Re)subscribe to `<base>/cmd` on every ConnAck and hand inbound
//!   commands to a [`SessionHandler`]
//! - Publish responses and beacons on `<base>/stat` through [`MqttSink`],
//!   the gateway's `StatusSink`
//! - Reconnect after errors and after a controlled disconnect
//!
//! ## Dependency rule
//! Same as other adapters: depends on `owbridge-app` and `owbridge-domain`.

mod config;
mod error;
mod session;
mod sink;

pub use config::MqttConfig;
pub use error::MqttError;
pub use session::{MqttSession, SessionHandler, options};
pub use sink::MqttSink;
