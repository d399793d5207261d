//! # owbridged, the owbridge daemon
//!
//! Composition root that wires the 1-Wire bus and the MQTT transport to the
//! gateway use-cases and runs until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize tracing
//! - Construct the bus adapter and the broker session
//! - Start the command dispatcher and the subscription scheduler
//! - Run the session loop, which reconnects after a restart command
//! - Handle graceful shutdown (SIGINT): announce `offline`, disconnect
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod gateway;

use std::sync::Arc;

use owbridge_adapter_mqtt::MqttSession;
use owbridge_adapter_virtual::VirtualBus;
use owbridge_app::context::GatewayContext;
use owbridge_app::dispatcher::CommandDispatcher;
use owbridge_app::registry::DeviceRegistry;
use owbridge_app::scheduler::SubscriptionScheduler;
use owbridge_domain::beacon::Beacon;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::gateway::{GatewayHandler, GatewayRestart};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // 1-Wire bus
    let bus = VirtualBus::new(&config.devices, &config.bus);
    let devices = bus.addresses().to_vec();
    let registry = DeviceRegistry::new(bus, devices);

    // Broker
    let (session, sink) = MqttSession::new(&config.mqtt)?;
    tracing::info!(
        broker = %format!("{}:{}", config.mqtt.broker_host, config.mqtt.broker_port),
        command_topic = %config.mqtt.command_topic(),
        status_topic = %sink.topic(),
        "starting owbridged"
    );

    // Use-cases
    let context = Arc::new(GatewayContext::new(registry, sink.clone()));
    let restart = GatewayRestart::new(Arc::clone(&context), sink.clone());
    let (queue, dispatcher) = CommandDispatcher::new(Arc::clone(&context), restart)
        .spawn(config.gateway.queue_capacity);
    let scheduler = SubscriptionScheduler::new(Arc::clone(&context)).spawn();

    let handler = GatewayHandler::new(Arc::clone(&context), queue);
    let shutdown = async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for shutdown signal");
            return;
        }
        tracing::info!("shutting down");
        scheduler.abort();
        if let Err(err) = context.publisher().publish_beacon(Beacon::OFFLINE).await {
            tracing::warn!(error = %err, "failed to publish offline beacon");
        }
        if let Err(err) = sink.disconnect().await {
            tracing::warn!(error = %err, "failed to disconnect from broker");
        }
    };

    session.run(handler, shutdown).await;
    dispatcher.abort();
    tracing::info!("owbridged stopped");

    Ok(())
}
