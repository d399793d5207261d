//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the gateway core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod bus;
pub mod control;
pub mod sink;

pub use bus::OneWireBus;
pub use control::SystemControl;
pub use sink::StatusSink;
