//! The retained presence beacon on the status topic.

use serde::Serialize;

/// Gateway connectivity as announced to the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeaconState {
    Online,
    Offline,
}

/// `{"state": "online" | "offline"}`, stamped with `time` when sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Beacon {
    pub state: BeaconState,
}

impl Beacon {
    pub const ONLINE: Self = Self {
        state: BeaconState::Online,
    };
    pub const OFFLINE: Self = Self {
        state: BeaconState::Offline,
    };
}
