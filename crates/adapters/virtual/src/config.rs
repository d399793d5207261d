//! Virtual bus configuration.

use owbridge_domain::address::DeviceAddress;
use serde::Deserialize;

/// One simulated device (`[[devices]]` table).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VirtualDeviceConfig {
    /// ROM id in `FC.SSSSSSSSSSSS` form.
    pub device_id: DeviceAddress,
    /// Bus multiplexer slot the device answers on.
    #[serde(default)]
    pub channel: u8,
    /// Whether the device answers at boot.
    #[serde(default = "default_present")]
    pub present: bool,
    /// Temperature in °C.
    pub temperature: Option<f64>,
    /// DS2438 A/D input voltage.
    pub vad: Option<f64>,
    /// DS2438 supply voltage.
    pub vdd: Option<f64>,
}

fn default_present() -> bool {
    true
}

/// Simulated bus timing (`[bus]` table).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VirtualBusConfig {
    /// Temperature conversion time in milliseconds.
    pub conversion_ms: u64,
}

impl Default for VirtualBusConfig {
    fn default() -> Self {
        Self { conversion_ms: 750 }
    }
}
