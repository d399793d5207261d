//! Device registry: configured devices and serialised bus access.

use owbridge_domain::address::DeviceAddress;
use owbridge_domain::attribute::Attribute;
use owbridge_domain::channel::Channel;
use owbridge_domain::error::GatewayError;
use owbridge_domain::family::FamilyCode;
use tokio::sync::Mutex;

use crate::ports::OneWireBus;

/// Outcome of reading one attribute from a device that answered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub channel: Channel,
    /// `None` for presence, which carries no value beyond the answer itself.
    pub value: Option<f64>,
}

/// Configured devices plus exclusive access to the bus.
///
/// Every bus operation goes through the internal lock so that a conversion
/// in progress is never interleaved with another command. The lock is
/// fair: waiters are served in the order they asked.
pub struct DeviceRegistry<B> {
    devices: Vec<DeviceAddress>,
    bus: Mutex<B>,
}

impl<B: OneWireBus> DeviceRegistry<B> {
    /// Create a registry over `bus`. Duplicate addresses are dropped,
    /// configuration order is kept.
    pub fn new(bus: B, devices: Vec<DeviceAddress>) -> Self {
        let mut unique: Vec<DeviceAddress> = Vec::with_capacity(devices.len());
        for address in devices {
            if !unique.contains(&address) {
                unique.push(address);
            }
        }
        Self {
            devices: unique,
            bus: Mutex::new(bus),
        }
    }

    /// Configured devices, fixed at boot.
    #[must_use]
    pub fn devices(&self) -> &[DeviceAddress] {
        &self.devices
    }

    /// Configured devices of one family.
    pub fn devices_of(&self, family: FamilyCode) -> impl Iterator<Item = DeviceAddress> + '_ {
        self.devices
            .iter()
            .copied()
            .filter(move |address| address.family_code() == family)
    }

    /// Attributes supported by a family. Empty for unknown families.
    #[must_use]
    pub fn attributes_for(&self, family: FamilyCode) -> &'static [Attribute] {
        family.attributes()
    }

    /// Whether `address` currently answers on the bus.
    ///
    /// # Errors
    ///
    /// Propagates bus failures.
    #[tracing::instrument(skip(self, address), fields(device_id = %address))]
    pub async fn is_present(&self, address: DeviceAddress) -> Result<bool, GatewayError> {
        let bus = self.bus.lock().await;
        Ok(bus.locate(address).await?.is_some())
    }

    /// Locate `address` and, if it answers, read `attribute` from it while
    /// holding the bus. Returns `None` for an absent device.
    ///
    /// # Errors
    ///
    /// Propagates bus failures.
    #[tracing::instrument(skip(self, address), fields(device_id = %address))]
    pub async fn sample(
        &self,
        address: DeviceAddress,
        attribute: Attribute,
    ) -> Result<Option<Sample>, GatewayError> {
        let bus = self.bus.lock().await;
        let Some(channel) = bus.locate(address).await? else {
            return Ok(None);
        };
        let value = match attribute {
            Attribute::Presence => None,
            _ => Some(bus.sample(address, channel, attribute).await?),
        };
        Ok(Some(Sample { channel, value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedBus, ds18b20, ds2411, ds2438};
    use std::sync::Arc;
    use std::time::Duration;

    fn bus() -> ScriptedBus {
        ScriptedBus::new()
            .with_device(ds18b20(), 1)
            .with_value(ds18b20(), Attribute::Temperature, 21.5)
    }

    #[test]
    fn should_keep_configuration_order_without_duplicates() {
        let registry = DeviceRegistry::new(bus(), vec![ds2438(), ds18b20(), ds2438(), ds2411()]);
        assert_eq!(registry.devices(), &[ds2438(), ds18b20(), ds2411()]);
    }

    #[test]
    fn should_filter_devices_by_family() {
        let registry = DeviceRegistry::new(bus(), vec![ds2438(), ds18b20(), ds2411()]);
        let found: Vec<_> = registry.devices_of(FamilyCode::DS18B20).collect();
        assert_eq!(found, vec![ds18b20()]);
        assert_eq!(registry.devices_of(FamilyCode::new(99)).count(), 0);
    }

    #[test]
    fn should_return_empty_attributes_for_unknown_family() {
        let registry = DeviceRegistry::new(bus(), Vec::new());
        assert!(registry.attributes_for(FamilyCode::new(99)).is_empty());
    }

    #[tokio::test]
    async fn should_report_presence_from_bus() {
        let registry = DeviceRegistry::new(bus(), vec![ds18b20(), ds2438()]);
        assert!(registry.is_present(ds18b20()).await.unwrap());
        assert!(!registry.is_present(ds2438()).await.unwrap());
    }

    #[tokio::test]
    async fn should_not_sample_absent_device() {
        let registry = DeviceRegistry::new(bus(), vec![ds2438()]);
        let sample = registry.sample(ds2438(), Attribute::Temperature).await.unwrap();
        assert_eq!(sample, None);
    }

    #[tokio::test]
    async fn should_sample_present_device_with_channel() {
        let registry = DeviceRegistry::new(bus(), vec![ds18b20()]);
        let sample = registry.sample(ds18b20(), Attribute::Temperature).await.unwrap();
        assert_eq!(
            sample,
            Some(Sample {
                channel: Channel(1),
                value: Some(21.5)
            })
        );
    }

    #[tokio::test]
    async fn should_read_presence_without_sampling() {
        let registry = DeviceRegistry::new(bus(), vec![ds18b20()]);
        let sample = registry.sample(ds18b20(), Attribute::Presence).await.unwrap();
        assert_eq!(sample.map(|s| s.value), Some(None));
    }

    #[tokio::test(start_paused = true)]
    async fn should_serialise_concurrent_samples() {
        let bus = Arc::new(bus().with_sample_delay(Duration::from_millis(750)));
        let registry = Arc::new(DeviceRegistry::new(Arc::clone(&bus), vec![ds18b20()]));

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.sample(ds18b20(), Attribute::Temperature).await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_some());
        }

        assert_eq!(bus.max_concurrent_samples(), 1);
    }
}
