//! Time and timestamp helpers.

use chrono::{DateTime, Local, NaiveDateTime};

/// Local wall-clock timestamp stamped on every published message.
pub type Timestamp = DateTime<Local>;

/// Wire format: `YYYY-MM-DD HH:MM:SS.ffffff`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Return the current local time.
#[must_use]
pub fn now() -> Timestamp {
    Local::now()
}

/// Render a timestamp in the wire format.
#[must_use]
pub fn format(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire-format timestamp.
///
/// # Errors
///
/// Returns [`chrono::ParseError`] if `text` does not match [`TIMESTAMP_FORMAT`].
pub fn parse(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
}
