//! Subscription scheduler: fires periodic reads for live subscriptions.
//!
//! Each due entry is read on its own task so that a slow conversion on one
//! key does not delay the deadline of another; the registry's bus lock keeps
//! the reads themselves one at a time. Results are published in completion
//! order.

use std::sync::Arc;

use owbridge_domain::subscription::SubscriptionKey;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::context::GatewayContext;
use crate::ports::{OneWireBus, StatusSink};

pub struct SubscriptionScheduler<B, S> {
    context: Arc<GatewayContext<B, S>>,
}

impl<B, S> SubscriptionScheduler<B, S>
where
    B: OneWireBus + 'static,
    S: StatusSink + 'static,
{
    pub fn new(context: Arc<GatewayContext<B, S>>) -> Self {
        Self { context }
    }

    /// Run the scheduler on its own task until aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Fire due subscriptions forever.
    ///
    /// Sleeps until the earliest deadline, or until the table changes.
    pub async fn run(self) {
        tracing::info!("subscription scheduler started");
        let subscriptions = self.context.subscriptions();
        loop {
            for key in subscriptions.take_due(Instant::now()) {
                self.fire(key);
            }
            match subscriptions.next_deadline() {
                Some(deadline) => {
                    tokio::select! {
                        () = tokio::time::sleep_until(deadline) => {}
                        () = subscriptions.changed() => {}
                    }
                }
                None => subscriptions.changed().await,
            }
        }
    }

    /// Read and publish one subscription.
    ///
    /// A read already in flight when its key is removed still publishes.
    /// The key is not fired again before this read is published.
    fn fire(&self, key: SubscriptionKey) {
        let context = Arc::clone(&self.context);
        tokio::spawn(async move {
            tracing::debug!(%key, "subscription tick");
            let envelope = context.read(key.target, key.attribute).await;
            if let Some(channel) = envelope.device.as_ref().and_then(|d| d.channel) {
                context.subscriptions().record_channel(key, channel);
            }
            context.publisher().publish_or_log(&envelope).await;
            context.subscriptions().finish(key);
        });
    }
}
