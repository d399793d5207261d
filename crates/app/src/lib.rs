//! # owbridge-app
//!
//! Application layer: gateway use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `OneWireBus`: presence detection and sampling on the 1-Wire bus
//!   - `StatusSink`: publishing on the status topic
//!   - `SystemControl`: the effect of a remote `restart`
//! - Provide the **use-cases**:
//!   - `CommandDispatcher` + `CommandQueue`: validate, queue and handle commands
//!   - `SubscriptionScheduler`: fire periodic reads for live subscriptions
//! - Own the **shared state** (`GatewayContext`): device registry with
//!   serialised bus access, subscription table, response publisher
//!
//! ## Dependency rule
//! Depends on `owbridge-domain` only (plus `tokio` for sync and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod context;
pub mod dispatcher;
pub mod ports;
pub mod publisher;
pub mod reader;
pub mod registry;
pub mod scheduler;
pub mod subscriptions;

#[cfg(test)]
mod testing;
