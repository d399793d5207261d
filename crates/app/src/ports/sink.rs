//! Status sink port: where responses and beacons go.

use std::future::Future;
use std::sync::Arc;

use owbridge_domain::error::GatewayError;

/// Publishes encoded messages on the status topic.
pub trait StatusSink: Send + Sync {
    /// Send one JSON document. Retained messages replace the broker's copy.
    fn send(
        &self,
        payload: String,
        retain: bool,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

impl<T: StatusSink> StatusSink for Arc<T> {
    fn send(
        &self,
        payload: String,
        retain: bool,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        (**self).send(payload, retain)
    }
}
