//! Bus multiplexer channels.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The bus multiplexer slot a device answered on.
///
/// Opaque to the protocol: it is only reported back in read results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub u8);

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
