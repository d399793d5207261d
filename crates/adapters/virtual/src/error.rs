//! Virtual bus error types.

use owbridge_domain::address::DeviceAddress;
use owbridge_domain::attribute::Attribute;
use owbridge_domain::channel::Channel;
use owbridge_domain::error::{BusError, GatewayError};

/// Errors raised by the simulated bus.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VirtualBusError {
    /// The address is not simulated or does not answer.
    #[error("device {0} does not answer")]
    NotResponding(DeviceAddress),

    /// The device has no simulated value for the attribute.
    #[error("device {address} has no simulated {attribute} value")]
    NoValue {
        address: DeviceAddress,
        attribute: Attribute,
    },

    /// Sampling was addressed to the wrong multiplexer slot.
    #[error("device {address} answers on channel {actual}, not {requested}")]
    WrongChannel {
        address: DeviceAddress,
        attribute: Attribute,
        requested: Channel,
        actual: Channel,
    },
}

impl From<VirtualBusError> for BusError {
    fn from(err: VirtualBusError) -> Self {
        match err {
            VirtualBusError::NotResponding(address) => Self::DeviceNotFound(address),
            VirtualBusError::NoValue { address, attribute } => {
                Self::Unsupported { address, attribute }
            }
            VirtualBusError::WrongChannel {
                address, attribute, ..
            } => Self::Sampling { address, attribute },
        }
    }
}

impl From<VirtualBusError> for GatewayError {
    fn from(err: VirtualBusError) -> Self {
        Self::Bus(err.into())
    }
}
