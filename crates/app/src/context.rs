//! Process-wide gateway state shared by the dispatcher and the scheduler.

use crate::ports::{OneWireBus, StatusSink};
use crate::publisher::ResponsePublisher;
use crate::registry::DeviceRegistry;
use crate::subscriptions::SubscriptionTable;

/// The single bus handle, subscription table and publisher of a gateway.
///
/// Wrapped in an `Arc` and handed to the
/// [`CommandDispatcher`](crate::dispatcher::CommandDispatcher) and the
/// [`SubscriptionScheduler`](crate::scheduler::SubscriptionScheduler).
pub struct GatewayContext<B, S> {
    registry: DeviceRegistry<B>,
    publisher: ResponsePublisher<S>,
    subscriptions: SubscriptionTable,
}

impl<B: OneWireBus, S: StatusSink> GatewayContext<B, S> {
    pub fn new(registry: DeviceRegistry<B>, sink: S) -> Self {
        Self {
            registry,
            publisher: ResponsePublisher::new(sink),
            subscriptions: SubscriptionTable::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry<B> {
        &self.registry
    }

    #[must_use]
    pub fn publisher(&self) -> &ResponsePublisher<S> {
        &self.publisher
    }

    #[must_use]
    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }
}
