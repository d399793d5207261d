//! 1-Wire device addresses in OWFS notation.
//!
//! A ROM id is written as the family code, a dot, then the serial, all in
//! hexadecimal: `28.FF4516130100`. Parsing is case-insensitive; formatting
//! is always uppercase and keeps the serial's digit count.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::family::FamilyCode;

/// Maximum number of hex digits in the 48-bit serial.
const MAX_SERIAL_DIGITS: u8 = 12;

/// Reasons a textual address is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// No `.` separating family code and serial.
    #[error("missing '.' between family code and serial")]
    MissingSeparator,

    /// Family code is not exactly two hex digits.
    #[error("family code must be two hex digits, got {0:?}")]
    InvalidFamilyCode(String),

    /// Serial is empty, too long, or contains non-hex characters.
    #[error("serial must be 1 to 12 hex digits, got {0:?}")]
    InvalidSerial(String),
}

/// A 1-Wire device address: family code plus 48-bit serial.
///
/// Identity is the `(family, serial)` value: `28.FF45161301` and
/// `28.00FF45161301` are the same device. The digit count only affects
/// formatting.
#[derive(Debug, Clone, Copy)]
pub struct DeviceAddress {
    family: FamilyCode,
    serial: u64,
    digits: u8,
}

impl PartialEq for DeviceAddress {
    fn eq(&self, other: &Self) -> bool {
        self.family == other.family && self.serial == other.serial
    }
}

impl Eq for DeviceAddress {}

impl Hash for DeviceAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.serial.hash(state);
    }
}

impl PartialOrd for DeviceAddress {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceAddress {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.family, self.serial).cmp(&(other.family, other.serial))
    }
}

impl DeviceAddress {
    /// Build an address from a family code and a full 12-digit serial.
    ///
    /// Bits above 48 are discarded.
    #[must_use]
    pub fn new(family: FamilyCode, serial: u64) -> Self {
        Self {
            family,
            serial: serial & 0xFFFF_FFFF_FFFF,
            digits: MAX_SERIAL_DIGITS,
        }
    }

    /// The family code (leading byte of the ROM id).
    #[must_use]
    pub fn family_code(&self) -> FamilyCode {
        self.family
    }

    /// The serial number.
    #[must_use]
    pub fn serial(&self) -> u64 {
        self.serial
    }
}

impl FromStr for DeviceAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (family, serial) = s.split_once('.').ok_or(AddressError::MissingSeparator)?;

        if family.len() != 2 || !family.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidFamilyCode(family.to_string()));
        }
        let digits = u8::try_from(serial.len())
            .ok()
            .filter(|d| (1..=MAX_SERIAL_DIGITS).contains(d))
            .ok_or_else(|| AddressError::InvalidSerial(serial.to_string()))?;
        if !serial.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidSerial(serial.to_string()));
        }

        let family = u8::from_str_radix(family, 16)
            .map_err(|_| AddressError::InvalidFamilyCode(family.to_string()))?;
        let value = u64::from_str_radix(serial, 16)
            .map_err(|_| AddressError::InvalidSerial(serial.to_string()))?;

        Ok(Self {
            family: FamilyCode::new(family),
            serial: value,
            digits,
        })
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}.{:0width$X}",
            self.family.value(),
            self.serial,
            width = usize::from(self.digits)
        )
    }
}

impl Serialize for DeviceAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
