//! Response publisher: stamps, encodes and sends status messages.

use owbridge_domain::beacon::Beacon;
use owbridge_domain::error::GatewayError;
use owbridge_domain::response::{Envelope, Stamped};
use owbridge_domain::time;
use serde::Serialize;

use crate::ports::StatusSink;

/// Thin layer over a [`StatusSink`].
///
/// The `time` field is taken when the message is handed to the sink, not
/// when the response was built.
pub struct ResponsePublisher<S> {
    sink: S,
}

impl<S: StatusSink> ResponsePublisher<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Publish a response or warning envelope (not retained).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Encode`] or the sink's transport error.
    pub async fn publish(&self, envelope: &Envelope) -> Result<(), GatewayError> {
        self.send(envelope, false).await
    }

    /// Publish the retained presence beacon.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Encode`] or the sink's transport error.
    pub async fn publish_beacon(&self, beacon: Beacon) -> Result<(), GatewayError> {
        self.send(&beacon, true).await
    }

    /// Publish an envelope, logging instead of failing.
    ///
    /// Used on paths that have nobody to report a publish failure to.
    pub async fn publish_or_log(&self, envelope: &Envelope) {
        if let Err(err) = self.publish(envelope).await {
            tracing::warn!(error = %err, "failed to publish status message");
        }
    }

    async fn send<T: Serialize + Sync>(&self, body: &T, retain: bool) -> Result<(), GatewayError> {
        let payload = Stamped::new(body, &time::now()).to_json()?;
        self.sink.send(payload, retain).await
    }
}
