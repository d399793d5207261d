//! Readable device attributes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An attribute that can be read from a 1-Wire device.
///
/// Wire names are case-sensitive: `presence`, `temperature`, `VAD`, `VDD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    #[serde(rename = "presence")]
    Presence,
    #[serde(rename = "temperature")]
    Temperature,
    /// A/D input voltage (DS2438).
    #[serde(rename = "VAD")]
    Vad,
    /// Supply voltage (DS2438).
    #[serde(rename = "VDD")]
    Vdd,
}

impl Attribute {
    /// The name used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Presence => "presence",
            Self::Temperature => "temperature",
            Self::Vad => "VAD",
            Self::Vdd => "VDD",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attribute name is not one of the recognised names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized attribute {0:?}")]
pub struct UnknownAttribute(pub String);

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "presence" => Ok(Self::Presence),
            "temperature" => Ok(Self::Temperature),
            "VAD" => Ok(Self::Vad),
            "VDD" => Ok(Self::Vdd),
            other => Err(UnknownAttribute(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_wire_names() {
        assert_eq!("presence".parse(), Ok(Attribute::Presence));
        assert_eq!("temperature".parse(), Ok(Attribute::Temperature));
        assert_eq!("VAD".parse(), Ok(Attribute::Vad));
        assert_eq!("VDD".parse(), Ok(Attribute::Vdd));
    }

    #[test]
    fn should_reject_wrong_casing() {
        assert!("vad".parse::<Attribute>().is_err());
        assert!("Temperature".parse::<Attribute>().is_err());
    }

    #[test]
    fn should_serialize_with_wire_name() {
        let json = serde_json::to_string(&Attribute::Vdd).unwrap();
        assert_eq!(json, "\"VDD\"");
    }

    #[test]
    fn should_display_wire_name() {
        assert_eq!(Attribute::Temperature.to_string(), "temperature");
    }
}
