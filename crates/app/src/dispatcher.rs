//! Command dispatcher: one handler per action, fed by a bounded queue.
//!
//! Inbound payloads are parsed and validated by [`CommandQueue::submit`] on
//! the transport's task, so malformed commands are answered immediately.
//! Valid requests are queued and handled one at a time by the worker
//! started with [`CommandDispatcher::spawn`].

use std::sync::Arc;
use std::time::Duration;

use owbridge_domain::attribute::Attribute;
use owbridge_domain::error::{ErrorKind, GatewayError};
use owbridge_domain::request::{Action, Request, Target};
use owbridge_domain::response::{DeviceReport, Envelope};
use owbridge_domain::subscription::SubscriptionKey;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::context::GatewayContext;
use crate::ports::{OneWireBus, StatusSink, SystemControl};
use crate::subscriptions::SubscribeOutcome;

/// Routes validated requests to their handlers and publishes the responses.
pub struct CommandDispatcher<B, S, C> {
    context: Arc<GatewayContext<B, S>>,
    control: C,
}

impl<B, S, C> CommandDispatcher<B, S, C>
where
    B: OneWireBus + 'static,
    S: StatusSink + 'static,
    C: SystemControl + 'static,
{
    pub fn new(context: Arc<GatewayContext<B, S>>, control: C) -> Self {
        Self { context, control }
    }

    /// Start the worker and return the queue feeding it.
    ///
    /// The worker stops once every [`CommandQueue`] handle is dropped.
    pub fn spawn(self, capacity: usize) -> (CommandQueue<B, S>, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel(capacity.max(1));
        let queue = CommandQueue {
            sender,
            context: Arc::clone(&self.context),
        };
        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                self.dispatch(request).await;
            }
            tracing::debug!("command queue closed, dispatcher stopped");
        });
        (queue, handle)
    }

    /// Handle one request to completion.
    pub async fn dispatch(&self, request: Request) {
        tracing::debug!(action = %request.action(), "processing command");
        match request {
            Request::Restart => self.restart().await,
            Request::Scan { target } => self.scan(target).await,
            Request::Read { target, attribute } => self.read(target, attribute).await,
            Request::Subscribe {
                target,
                attribute,
                interval,
            } => self.subscribe(target, attribute, interval).await,
            Request::Unsubscribe { target, attribute } => self.unsubscribe(target, attribute).await,
        }
    }

    async fn publish(&self, envelope: &Envelope) {
        self.context.publisher().publish_or_log(envelope).await;
    }

    #[tracing::instrument(skip(self))]
    async fn restart(&self) {
        // the acknowledgement must be handed over before the session goes down
        if let Err(err) = self
            .context
            .publisher()
            .publish(&Envelope::acknowledge(Action::Restart, None))
            .await
        {
            tracing::warn!(error = %err, "failed to acknowledge restart");
        }
        tracing::info!("restart requested via remote command");
        if let Err(err) = self.control.restart().await {
            tracing::error!(error = %err, "restart failed");
        }
    }

    #[tracing::instrument(skip(self))]
    async fn scan(&self, target: Option<Target>) {
        let envelope = match self.scan_envelope(target).await {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(error = %err, "1-Wire scan failed");
                Envelope::error(ErrorKind::ReadFailed, None)
            }
        };
        self.publish(&envelope).await;
    }

    async fn scan_envelope(&self, target: Option<Target>) -> Result<Envelope, GatewayError> {
        let registry = self.context.registry();
        match target {
            Some(Target::Device(address)) => {
                let present = registry.is_present(address).await?;
                Ok(Envelope::device(Action::Scan, DeviceReport::scanned(address, present)))
            }
            Some(Target::Family(family)) => {
                let mut reports = Vec::new();
                for address in registry.devices_of(family) {
                    let present = registry.is_present(address).await?;
                    reports.push(DeviceReport::scanned(address, present));
                }
                Ok(Envelope::devices(Action::Scan, Some(family), reports))
            }
            None => {
                let mut reports = Vec::with_capacity(registry.devices().len());
                for &address in registry.devices() {
                    let present = registry.is_present(address).await?;
                    reports.push(DeviceReport::scanned(address, present));
                }
                Ok(Envelope::devices(Action::Scan, None, reports))
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn read(&self, target: Target, attribute: Attribute) {
        let envelope = self.context.read(target, attribute).await;
        self.publish(&envelope).await;
    }

    #[tracing::instrument(skip(self, interval), fields(interval_ms = interval.as_millis()))]
    async fn subscribe(&self, target: Target, attribute: Attribute, interval: Duration) {
        let key = SubscriptionKey::new(target, attribute);
        let subscriptions = self.context.subscriptions();

        match subscriptions.subscribe(key, interval, Instant::now()) {
            SubscribeOutcome::Created => {
                tracing::info!(%key, "subscription created");
                self.publish(&Envelope::acknowledge(Action::Subscribe, Some(target)))
                    .await;

                let envelope = self.context.read(target, attribute).await;
                if let Some(channel) = envelope.device.as_ref().and_then(|d| d.channel) {
                    subscriptions.record_channel(key, channel);
                }
                self.publish(&envelope).await;
                subscriptions.prime(key);
            }
            SubscribeOutcome::Updated => {
                tracing::warn!(%key, "already subscribed, interval updated");
                self.publish(&Envelope::error(ErrorKind::AlreadySubscribed, None))
                    .await;
            }
        }
    }

    #[tracing::instrument(skip(self))]
    async fn unsubscribe(&self, target: Target, attribute: Attribute) {
        let key = SubscriptionKey::new(target, attribute);
        if self.context.subscriptions().unsubscribe(key) {
            tracing::info!(%key, "subscription removed");
            self.publish(&Envelope::acknowledge(Action::Unsubscribe, Some(target)))
                .await;
        } else {
            tracing::warn!(%key, "no subscription to remove");
            self.publish(&Envelope::error(key.missing_kind(), None)).await;
        }
    }
}

/// Inbound side of the dispatcher.
pub struct CommandQueue<B, S> {
    sender: mpsc::Sender<Request>,
    context: Arc<GatewayContext<B, S>>,
}

impl<B, S> Clone for CommandQueue<B, S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            context: Arc::clone(&self.context),
        }
    }
}

impl<B: OneWireBus, S: StatusSink> CommandQueue<B, S> {
    /// Parse, validate and enqueue a raw command payload.
    ///
    /// Rejected and overflowing commands are answered with an `error`
    /// envelope right away and still return `Ok`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::QueueUnavailable`] when the worker is gone,
    /// or the publisher's error when the rejection cannot be sent.
    pub async fn submit(&self, payload: &[u8]) -> Result<(), GatewayError> {
        let request = match Request::parse(payload) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "rejected command");
                let envelope = Envelope::error(err.kind(), err.into_request());
                return self.context.publisher().publish(&envelope).await;
            }
        };

        match self.sender.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(request)) => {
                tracing::error!(action = %request.action(), "command queue full");
                let echo = serde_json::from_slice::<Value>(payload).ok();
                let envelope = Envelope::error(ErrorKind::QueueFull, echo);
                self.context.publisher().publish(&envelope).await
            }
            Err(TrySendError::Closed(_)) => Err(GatewayError::QueueUnavailable),
        }
    }
}
