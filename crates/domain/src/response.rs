//! Outbound envelopes published on the status topic.
//!
//! An [`Envelope`] carries exactly one payload shape:
//! - `acknowledge: true` with a target echo (restart, subscribe, unsubscribe)
//! - `device: {…}` for single-device scan/read results
//! - `devices: […]` for scan-all and family results
//! - `error: {message, request}` for failures and warnings
//!
//! The `time` field is not part of the envelope; it is stamped when the
//! envelope is serialized for sending, see [`Stamped`].

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::address::DeviceAddress;
use crate::attribute::Attribute;
use crate::channel::Channel;
use crate::error::ErrorKind;
use crate::family::FamilyCode;
use crate::request::{Action, Target};
use crate::time::{self, Timestamp};

/// Per-device entry of a `device` or `devices` payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    pub device_id: DeviceAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
    /// Sampled values keyed by attribute name (`temperature`, `VAD`, `VDD`).
    #[serde(flatten)]
    pub values: BTreeMap<Attribute, f64>,
}

impl DeviceReport {
    fn bare(device_id: DeviceAddress) -> Self {
        Self {
            channel: None,
            device_id,
            presence: None,
            attributes: None,
            values: BTreeMap::new(),
        }
    }

    /// Target echo used in acknowledgements.
    #[must_use]
    pub fn acknowledged(device_id: DeviceAddress) -> Self {
        Self::bare(device_id)
    }

    /// Scan result: presence plus the family's attribute list.
    #[must_use]
    pub fn scanned(device_id: DeviceAddress, present: bool) -> Self {
        Self {
            presence: Some(present),
            attributes: Some(device_id.family_code().attributes().to_vec()),
            ..Self::bare(device_id)
        }
    }

    /// Presence-only read result.
    #[must_use]
    pub fn presence(device_id: DeviceAddress, channel: Option<Channel>, present: bool) -> Self {
        Self {
            channel,
            presence: Some(present),
            ..Self::bare(device_id)
        }
    }

    /// Sampled read result.
    #[must_use]
    pub fn sampled(device_id: DeviceAddress, channel: Channel, attribute: Attribute, value: f64) -> Self {
        let mut report = Self::bare(device_id);
        report.channel = Some(channel);
        report.values.insert(attribute, value);
        report
    }

    /// Mark the device as present.
    #[must_use]
    pub fn with_presence(mut self) -> Self {
        self.presence = Some(true);
        self
    }

    /// The sampled value of `attribute`, if any.
    #[must_use]
    pub fn value(&self, attribute: Attribute) -> Option<f64> {
        self.values.get(&attribute).copied()
    }
}

/// Payload of an `error` envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub message: &'static str,
    /// Echo of the offending request, `null` when not echoed.
    pub request: Option<Value>,
}

/// A response or warning published on the status topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_code: Option<FamilyCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<DeviceReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl Envelope {
    fn empty() -> Self {
        Self {
            action: None,
            acknowledge: None,
            family_code: None,
            device: None,
            devices: None,
            error: None,
        }
    }

    /// `acknowledge: true`, echoing the target when there is one.
    #[must_use]
    pub fn acknowledge(action: Action, target: Option<Target>) -> Self {
        let mut envelope = Self {
            action: Some(action),
            acknowledge: Some(true),
            ..Self::empty()
        };
        match target {
            Some(Target::Device(addr)) => envelope.device = Some(DeviceReport::acknowledged(addr)),
            Some(Target::Family(code)) => envelope.family_code = Some(code),
            None => {}
        }
        envelope
    }

    /// Single-device result.
    #[must_use]
    pub fn device(action: Action, report: DeviceReport) -> Self {
        Self {
            action: Some(action),
            device: Some(report),
            ..Self::empty()
        }
    }

    /// Multi-device result, echoing the family code for family targets.
    #[must_use]
    pub fn devices(action: Action, family_code: Option<FamilyCode>, reports: Vec<DeviceReport>) -> Self {
        Self {
            action: Some(action),
            family_code,
            devices: Some(reports),
            ..Self::empty()
        }
    }

    /// Error or warning from the catalogue.
    #[must_use]
    pub fn error(kind: ErrorKind, request: Option<Value>) -> Self {
        Self {
            error: Some(ErrorReport {
                message: kind.message(),
                request,
            }),
            ..Self::empty()
        }
    }

    /// Whether this envelope reports an error or warning.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A message body with its send-time timestamp prepended.
#[derive(Debug, Serialize)]
pub struct Stamped<'a, T> {
    pub time: String,
    #[serde(flatten)]
    pub body: &'a T,
}

impl<'a, T: Serialize> Stamped<'a, T> {
    /// Stamp `body` with `ts`.
    #[must_use]
    pub fn new(body: &'a T, ts: &Timestamp) -> Self {
        Self {
            time: time::format(ts),
            body,
        }
    }

    /// Serialize to the JSON text sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the body cannot be serialized.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
