//! 1-Wire bus port: presence detection and sampling.

use std::future::Future;
use std::sync::Arc;

use owbridge_domain::address::DeviceAddress;
use owbridge_domain::attribute::Attribute;
use owbridge_domain::channel::Channel;
use owbridge_domain::error::GatewayError;

/// Access to the physical 1-Wire bus.
///
/// Calls are never issued concurrently: the
/// [`DeviceRegistry`](crate::registry::DeviceRegistry) serialises them.
pub trait OneWireBus: Send + Sync {
    /// Find the channel `address` answers on, or `None` if it is absent.
    fn locate(
        &self,
        address: DeviceAddress,
    ) -> impl Future<Output = Result<Option<Channel>, GatewayError>> + Send;

    /// Sample a non-presence attribute of a device located on `channel`.
    ///
    /// May take as long as a conversion cycle (hundreds of milliseconds).
    fn sample(
        &self,
        address: DeviceAddress,
        channel: Channel,
        attribute: Attribute,
    ) -> impl Future<Output = Result<f64, GatewayError>> + Send;
}

impl<T: OneWireBus> OneWireBus for Arc<T> {
    fn locate(
        &self,
        address: DeviceAddress,
    ) -> impl Future<Output = Result<Option<Channel>, GatewayError>> + Send {
        (**self).locate(address)
    }

    fn sample(
        &self,
        address: DeviceAddress,
        channel: Channel,
        attribute: Attribute,
    ) -> impl Future<Output = Result<f64, GatewayError>> + Send {
        (**self).sample(address, channel, attribute)
    }
}
