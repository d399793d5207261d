//! Device families and their capabilities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::Attribute;

/// The leading byte of a 1-Wire ROM id, identifying the device type.
///
/// Serialized as a plain JSON integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FamilyCode(u8);

impl FamilyCode {
    /// DS2401/DS2411 silicon serial number.
    pub const DS2411: Self = Self(0x01);
    /// DS2438 battery monitor.
    pub const DS2438: Self = Self(0x26);
    /// DS18B20 temperature sensor.
    pub const DS18B20: Self = Self(0x28);

    #[must_use]
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Supported attributes, in wire order. Empty for unknown families.
    #[must_use]
    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            Self::DS2411 => &[Attribute::Presence],
            Self::DS2438 => &[
                Attribute::Presence,
                Attribute::Temperature,
                Attribute::Vad,
                Attribute::Vdd,
            ],
            Self::DS18B20 => &[Attribute::Presence, Attribute::Temperature],
            _ => &[],
        }
    }

    /// Whether `attribute` can be read from devices of this family.
    ///
    /// Presence is a property of the bus, so it is readable for any family.
    #[must_use]
    pub fn supports(self, attribute: Attribute) -> bool {
        attribute == Attribute::Presence || self.attributes().contains(&attribute)
    }
}

impl fmt::Display for FamilyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
