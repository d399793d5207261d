//! Common error types used across the workspace.
//!
//! [`GatewayError`] is the error that crosses port boundaries. Protocol-level
//! failures are not errors in that sense: they are reported to the caller as
//! `error` envelopes whose text comes from the [`ErrorKind`] catalogue.

use crate::address::DeviceAddress;
use crate::attribute::Attribute;

/// Base error for the gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The 1-Wire bus collaborator failed.
    #[error("1-Wire bus error")]
    Bus(#[from] BusError),

    /// The message transport failed (publish, connect, …).
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An outbound message could not be encoded.
    #[error("failed to encode message")]
    Encode(#[from] serde_json::Error),

    /// The inbound command queue is closed or full.
    #[error("command queue unavailable")]
    QueueUnavailable,
}

/// Failures reported by the 1-Wire bus collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BusError {
    /// The device did not answer on any channel.
    #[error("1-Wire device {0} not found")]
    DeviceNotFound(DeviceAddress),

    /// The device family cannot provide this attribute.
    #[error("attribute {attribute} not supported by device {address}")]
    Unsupported {
        address: DeviceAddress,
        attribute: Attribute,
    },

    /// Conversion or scratchpad read failed.
    #[error("sampling {attribute} on device {address} failed")]
    Sampling {
        address: DeviceAddress,
        attribute: Attribute,
    },
}

/// Catalogue of error messages published on the status topic.
///
/// The strings are matched byte-for-byte by existing monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Deserialize,
    InvalidTarget,
    InvalidAttribute,
    InvalidAttributeOrInterval,
    UnknownAction,
    AlreadySubscribed,
    NoDeviceSubscription,
    NoFamilySubscription,
    UnsupportedAttribute,
    ReadFailed,
    QueueFull,
}

impl ErrorKind {
    /// The exact message text.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Deserialize => "Failed to deserialize MQTT message.",
            Self::InvalidTarget => {
                "Missing or invalid JSON attributes 'device_id' or 'family_code'."
            }
            Self::InvalidAttribute => "Missing or invalid JSON attribute 'attribute'.",
            Self::InvalidAttributeOrInterval => {
                "Missing or invalid JSON attributes 'attribute' or 'interval'."
            }
            Self::UnknownAction => "Unknown/Unsupported action.",
            Self::AlreadySubscribed => {
                "WARN: Already subscribed to device / attribute. Updating subscription."
            }
            Self::NoDeviceSubscription => {
                "WARN: No subscription for requested device / attribute found."
            }
            Self::NoFamilySubscription => "WARN: No subscription for requested device family found.",
            Self::UnsupportedAttribute => "Unsupported device attribute for device family.",
            Self::ReadFailed => "Failed to read 1-Wire device.",
            Self::QueueFull => "Command queue full.",
        }
    }
}
