//! Subscription keys.

use std::fmt;

use crate::attribute::Attribute;
use crate::error::ErrorKind;
use crate::request::Target;

/// Identifies a subscription: at most one is live per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionKey {
    pub target: Target,
    pub attribute: Attribute,
}

impl SubscriptionKey {
    #[must_use]
    pub fn new(target: Target, attribute: Attribute) -> Self {
        Self { target, attribute }
    }

    /// The warning reported when unsubscribing a key that is not live.
    #[must_use]
    pub fn missing_kind(&self) -> ErrorKind {
        match self.target {
            Target::Device(_) => ErrorKind::NoDeviceSubscription,
            Target::Family(_) => ErrorKind::NoFamilySubscription,
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target, self.attribute)
    }
}
