//! # owbridge-adapter-virtual
//!
//! Simulated 1-Wire bus that stands in for the hardware driver.
//!
//! Devices come from the `[[devices]]` configuration table. Each answers on
//! its configured channel and reports fixed values; temperature conversions
//! take `[bus] conversion_ms` like a real DS18B20 at 12-bit resolution.
//!
//! ## Dependency rule
//!
//! Depends on `owbridge-app` (port traits) and `owbridge-domain` only.

mod config;
mod device;
mod error;

pub use config::{VirtualBusConfig, VirtualDeviceConfig};
pub use error::VirtualBusError;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use owbridge_app::ports::OneWireBus;
use owbridge_domain::address::DeviceAddress;
use owbridge_domain::attribute::Attribute;
use owbridge_domain::channel::Channel;
use owbridge_domain::error::GatewayError;

use device::SimulatedDevice;

/// In-memory 1-Wire bus.
pub struct VirtualBus {
    addresses: Vec<DeviceAddress>,
    devices: Mutex<HashMap<DeviceAddress, SimulatedDevice>>,
    conversion: Duration,
}

impl VirtualBus {
    /// Build the bus from configuration. Later entries win on duplicates.
    #[must_use]
    pub fn new(devices: &[VirtualDeviceConfig], bus: &VirtualBusConfig) -> Self {
        let mut addresses = Vec::with_capacity(devices.len());
        let mut simulated = HashMap::with_capacity(devices.len());
        for config in devices {
            if simulated
                .insert(config.device_id, SimulatedDevice::from(config))
                .is_none()
            {
                addresses.push(config.device_id);
            }
        }
        tracing::debug!(devices = addresses.len(), "virtual 1-Wire bus ready");
        Self {
            addresses,
            devices: Mutex::new(simulated),
            conversion: Duration::from_millis(bus.conversion_ms),
        }
    }

    /// Simulated addresses, in configuration order.
    #[must_use]
    pub fn addresses(&self) -> &[DeviceAddress] {
        &self.addresses
    }

    /// Plug or unplug a simulated device. Unknown addresses are ignored.
    pub fn set_present(&self, address: DeviceAddress, present: bool) {
        if let Some(device) = self.lock().get_mut(&address) {
            device.present = present;
        }
    }

    /// Change a simulated reading. Unknown addresses are ignored.
    pub fn set_value(&self, address: DeviceAddress, attribute: Attribute, value: f64) {
        if let Some(device) = self.lock().get_mut(&address) {
            device.set_value(attribute, value);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<DeviceAddress, SimulatedDevice>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(
        &self,
        address: DeviceAddress,
        channel: Channel,
        attribute: Attribute,
    ) -> Result<f64, VirtualBusError> {
        let devices = self.lock();
        let device = devices
            .get(&address)
            .filter(|device| device.present)
            .ok_or(VirtualBusError::NotResponding(address))?;
        if device.channel != channel {
            return Err(VirtualBusError::WrongChannel {
                address,
                attribute,
                requested: channel,
                actual: device.channel,
            });
        }
        device
            .value(attribute)
            .ok_or(VirtualBusError::NoValue { address, attribute })
    }
}

impl OneWireBus for VirtualBus {
    async fn locate(&self, address: DeviceAddress) -> Result<Option<Channel>, GatewayError> {
        let channel = self
            .lock()
            .get(&address)
            .filter(|device| device.present)
            .map(|device| device.channel);
        Ok(channel)
    }

    async fn sample(
        &self,
        address: DeviceAddress,
        channel: Channel,
        attribute: Attribute,
    ) -> Result<f64, GatewayError> {
        if attribute == Attribute::Temperature && !self.conversion.is_zero() {
            tokio::time::sleep(self.conversion).await;
        }
        let value = self.lookup(address, channel, attribute)?;
        tracing::trace!(device_id = %address, %attribute, value, "sampled");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use owbridge_domain::error::BusError;

    fn ds18b20() -> DeviceAddress {
        "28.FF4516130100".parse().unwrap()
    }

    fn ds2438() -> DeviceAddress {
        "26.00000A1B2C3D".parse().unwrap()
    }

    fn device(device_id: DeviceAddress, channel: u8) -> VirtualDeviceConfig {
        VirtualDeviceConfig {
            device_id,
            channel,
            present: true,
            temperature: None,
            vad: None,
            vdd: None,
        }
    }

    fn bus() -> VirtualBus {
        let devices = vec![
            VirtualDeviceConfig {
                temperature: Some(21.5),
                ..device(ds18b20(), 1)
            },
            VirtualDeviceConfig {
                vad: Some(4.5),
                vdd: Some(5.0),
                ..device(ds2438(), 2)
            },
        ];
        VirtualBus::new(&devices, &VirtualBusConfig::default())
    }

    #[test]
    fn should_keep_configuration_order() {
        assert_eq!(bus().addresses(), &[ds18b20(), ds2438()]);
    }

    #[test]
    fn should_ignore_duplicate_addresses_in_order() {
        let devices = vec![device(ds18b20(), 1), device(ds2438(), 2), device(ds18b20(), 3)];
        let bus = VirtualBus::new(&devices, &VirtualBusConfig::default());
        assert_eq!(bus.addresses(), &[ds18b20(), ds2438()]);
    }

    #[tokio::test]
    async fn should_locate_present_device_on_its_channel() {
        let bus = bus();
        assert_eq!(bus.locate(ds2438()).await.unwrap(), Some(Channel(2)));
    }

    #[tokio::test]
    async fn should_not_locate_unplugged_device() {
        let bus = bus();
        bus.set_present(ds2438(), false);
        assert_eq!(bus.locate(ds2438()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_not_locate_unknown_device() {
        let unknown = "01.000000000001".parse().unwrap();
        assert_eq!(bus().locate(unknown).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_for_temperature_conversion() {
        let bus = bus();
        let started = tokio::time::Instant::now();

        let value = bus
            .sample(ds18b20(), Channel(1), Attribute::Temperature)
            .await
            .unwrap();

        assert_eq!(value, 21.5);
        assert_eq!(started.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn should_sample_voltage_without_conversion_delay() {
        let bus = bus();
        let started = tokio::time::Instant::now();

        let value = bus.sample(ds2438(), Channel(2), Attribute::Vad).await.unwrap();

        assert_eq!(value, 4.5);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn should_reflect_updated_value() {
        let bus = bus();
        bus.set_value(ds2438(), Attribute::Vdd, 4.8);
        let value = bus.sample(ds2438(), Channel(2), Attribute::Vdd).await.unwrap();
        assert_eq!(value, 4.8);
    }

    #[tokio::test]
    async fn should_fail_sampling_missing_value() {
        let err = bus()
            .sample(ds2438(), Channel(2), Attribute::Temperature)
            .await;
        let err = match err {
            Err(GatewayError::Bus(err)) => err,
            other => panic!("unexpected result: {other:?}"),
        };
        assert_eq!(
            err,
            BusError::Unsupported {
                address: ds2438(),
                attribute: Attribute::Temperature
            }
        );
    }

    #[tokio::test]
    async fn should_fail_sampling_on_wrong_channel() {
        let result = bus().sample(ds2438(), Channel(7), Attribute::Vad).await;
        assert!(matches!(
            result,
            Err(GatewayError::Bus(BusError::Sampling { .. }))
        ));
    }

    #[tokio::test]
    async fn should_fail_sampling_unplugged_device() {
        let bus = bus();
        bus.set_present(ds2438(), false);
        let result = bus.sample(ds2438(), Channel(2), Attribute::Vad).await;
        assert!(matches!(
            result,
            Err(GatewayError::Bus(BusError::DeviceNotFound(_)))
        ));
    }
}
