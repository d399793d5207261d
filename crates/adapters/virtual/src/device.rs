//! A simulated 1-Wire device.

use owbridge_domain::attribute::Attribute;
use owbridge_domain::channel::Channel;

use crate::config::VirtualDeviceConfig;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimulatedDevice {
    pub channel: Channel,
    pub present: bool,
    temperature: Option<f64>,
    vad: Option<f64>,
    vdd: Option<f64>,
}

impl SimulatedDevice {
    pub fn value(&self, attribute: Attribute) -> Option<f64> {
        match attribute {
            Attribute::Presence => None,
            Attribute::Temperature => self.temperature,
            Attribute::Vad => self.vad,
            Attribute::Vdd => self.vdd,
        }
    }

    /// Presence is not a value; see [`VirtualBus::set_present`](crate::VirtualBus::set_present).
    pub fn set_value(&mut self, attribute: Attribute, value: f64) {
        match attribute {
            Attribute::Presence => {}
            Attribute::Temperature => self.temperature = Some(value),
            Attribute::Vad => self.vad = Some(value),
            Attribute::Vdd => self.vdd = Some(value),
        }
    }
}

impl From<&VirtualDeviceConfig> for SimulatedDevice {
    fn from(config: &VirtualDeviceConfig) -> Self {
        Self {
            channel: Channel(config.channel),
            present: config.present,
            temperature: config.temperature,
            vad: config.vad,
            vdd: config.vdd,
        }
    }
}
