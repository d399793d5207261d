//! System control port: the effect of a `restart` command.

use std::future::Future;
use std::sync::Arc;

use owbridge_domain::error::GatewayError;

/// Restarts the gateway.
///
/// Called only after the acknowledgement has been handed to the sink.
/// Implementations announce `offline`, drop all subscriptions and reconnect.
pub trait SystemControl: Send + Sync {
    fn restart(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

impl<T: SystemControl> SystemControl for Arc<T> {
    fn restart(&self) -> impl Future<Output = Result<(), GatewayError>> + Send {
        (**self).restart()
    }
}
