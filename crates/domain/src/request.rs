//! Inbound commands: the typed [`Request`] and its parser/validator.
//!
//! Parsing happens in two steps. [`Request::parse`] turns raw bytes into
//! JSON and fails with [`RequestError::Deserialize`] for malformed payloads.
//! [`Request::validate`] then applies the rules of the requested action and
//! fails with [`RequestError::Rejected`], which carries the caller's payload
//! back so it can be echoed in the error envelope.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::address::DeviceAddress;
use crate::attribute::Attribute;
use crate::error::ErrorKind;
use crate::family::FamilyCode;

/// JSON field names of the command protocol.
pub mod keys {
    pub const ACTION: &str = "action";
    pub const DEVICE_ID: &str = "device_id";
    pub const FAMILY_CODE: &str = "family_code";
    pub const ATTRIBUTE: &str = "attribute";
    pub const INTERVAL: &str = "interval";
}

/// The action named by a request and echoed in its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Restart,
    Scan,
    Read,
    Subscribe,
    Unsubscribe,
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Scan => "scan",
            Self::Read => "read",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restart" => Ok(Self::Restart),
            "scan" => Ok(Self::Scan),
            "read" => Ok(Self::Read),
            "subscribe" => Ok(Self::Subscribe),
            "unsubscribe" => Ok(Self::Unsubscribe),
            _ => Err(()),
        }
    }
}

/// What a command is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    /// A single device.
    Device(DeviceAddress),
    /// Every configured device of a family.
    Family(FamilyCode),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(addr) => write!(f, "device({addr})"),
            Self::Family(code) => write!(f, "family({code})"),
        }
    }
}

/// A validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Restart,
    Scan {
        target: Option<Target>,
    },
    Read {
        target: Target,
        attribute: Attribute,
    },
    Subscribe {
        target: Target,
        attribute: Attribute,
        interval: Duration,
    },
    Unsubscribe {
        target: Target,
        attribute: Attribute,
    },
}

/// Why a payload could not be turned into a [`Request`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The payload is not well-formed JSON.
    #[error("failed to deserialize request payload")]
    Deserialize(#[source] serde_json::Error),

    /// The payload is JSON but violates the rules of its action.
    #[error("request rejected: {kind:?}")]
    Rejected {
        kind: ErrorKind,
        /// The caller's payload, echoed verbatim.
        request: Value,
    },
}

impl RequestError {
    /// The catalogue entry to report.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Deserialize(_) => ErrorKind::Deserialize,
            Self::Rejected { kind, .. } => *kind,
        }
    }

    /// The payload to echo back, if any.
    #[must_use]
    pub fn into_request(self) -> Option<Value> {
        match self {
            Self::Deserialize(_) => None,
            Self::Rejected { request, .. } => Some(request),
        }
    }
}

impl Request {
    /// Parse and validate a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Deserialize`] when `payload` is not JSON, or
    /// [`RequestError::Rejected`] when [`validate`](Self::validate) fails.
    pub fn parse(payload: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(payload).map_err(RequestError::Deserialize)?;
        Self::validate(value)
    }

    /// Validate a JSON document against the rules of its `action`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Rejected`] with the matching [`ErrorKind`]:
    /// - [`ErrorKind::UnknownAction`] when `action` is missing or unknown,
    ///   or the document is not an object
    /// - [`ErrorKind::InvalidTarget`] when targeting is missing, ambiguous
    ///   or malformed
    /// - [`ErrorKind::InvalidAttribute`] for `read`/`unsubscribe` without a
    ///   recognised `attribute`
    /// - [`ErrorKind::InvalidAttributeOrInterval`] for `subscribe` without a
    ///   recognised `attribute` or a positive integer `interval`
    pub fn validate(value: Value) -> Result<Self, RequestError> {
        let reject = |kind: ErrorKind, request: Value| RequestError::Rejected { kind, request };

        let Some(fields) = value.as_object() else {
            return Err(reject(ErrorKind::UnknownAction, value));
        };
        let Some(action) = fields
            .get(keys::ACTION)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<Action>().ok())
        else {
            return Err(reject(ErrorKind::UnknownAction, value));
        };

        let result = match action {
            Action::Restart => Ok(Self::Restart),
            Action::Scan => validate_scan(fields),
            Action::Read => validate_read(fields),
            Action::Subscribe => validate_subscribe(fields),
            Action::Unsubscribe => validate_unsubscribe(fields),
        };
        result.map_err(|kind| reject(kind, value))
    }

    /// The action this request performs.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Restart => Action::Restart,
            Self::Scan { .. } => Action::Scan,
            Self::Read { .. } => Action::Read,
            Self::Subscribe { .. } => Action::Subscribe,
            Self::Unsubscribe { .. } => Action::Unsubscribe,
        }
    }
}

fn validate_scan(fields: &Map<String, Value>) -> Result<Request, ErrorKind> {
    let target = parse_target(fields)?;
    Ok(Request::Scan { target })
}

fn validate_read(fields: &Map<String, Value>) -> Result<Request, ErrorKind> {
    let target = require_target(fields)?;
    let attribute = parse_attribute(fields).ok_or(ErrorKind::InvalidAttribute)?;
    Ok(Request::Read { target, attribute })
}

fn validate_subscribe(fields: &Map<String, Value>) -> Result<Request, ErrorKind> {
    let target = require_target(fields)?;
    let attribute = parse_attribute(fields);
    let interval = parse_interval(fields);
    match (attribute, interval) {
        (Some(attribute), Some(interval)) => Ok(Request::Subscribe {
            target,
            attribute,
            interval,
        }),
        _ => Err(ErrorKind::InvalidAttributeOrInterval),
    }
}

fn validate_unsubscribe(fields: &Map<String, Value>) -> Result<Request, ErrorKind> {
    let target = require_target(fields)?;
    let attribute = parse_attribute(fields).ok_or(ErrorKind::InvalidAttribute)?;
    Ok(Request::Unsubscribe { target, attribute })
}

fn require_target(fields: &Map<String, Value>) -> Result<Target, ErrorKind> {
    parse_target(fields)?.ok_or(ErrorKind::InvalidTarget)
}

/// Exactly one of `device_id` / `family_code` may be given. A field that is
/// present but malformed counts as a targeting error. `null` counts as absent.
fn parse_target(fields: &Map<String, Value>) -> Result<Option<Target>, ErrorKind> {
    let device = present(fields, keys::DEVICE_ID)
        .map(|v| {
            v.as_str()
                .and_then(|s| s.parse::<DeviceAddress>().ok())
                .ok_or(ErrorKind::InvalidTarget)
        })
        .transpose()?;
    let family = present(fields, keys::FAMILY_CODE)
        .map(|v| {
            v.as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .map(FamilyCode::new)
                .ok_or(ErrorKind::InvalidTarget)
        })
        .transpose()?;

    match (device, family) {
        (Some(addr), None) => Ok(Some(Target::Device(addr))),
        (None, Some(code)) => Ok(Some(Target::Family(code))),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Err(ErrorKind::InvalidTarget),
    }
}

fn parse_attribute(fields: &Map<String, Value>) -> Option<Attribute> {
    present(fields, keys::ATTRIBUTE)?.as_str()?.parse().ok()
}

fn parse_interval(fields: &Map<String, Value>) -> Option<Duration> {
    let millis = present(fields, keys::INTERVAL)?.as_u64()?;
    let millis = u32::try_from(millis).ok().filter(|ms| *ms > 0)?;
    Some(Duration::from_millis(u64::from(millis)))
}

fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|v| !v.is_null())
}
