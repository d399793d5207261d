//! # owbridge-domain
//!
//! Pure domain model for the owbridge 1-Wire to MQTT gateway.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, the wire timestamp format
//! - Define **addresses** (`FC.SSSSSSSSSSSS` 1-Wire ROM ids) and **families**
//!   (family code → supported attributes)
//! - Define the **command protocol**: typed [`request::Request`] variants and
//!   the parser/validator that produces them from raw payloads
//! - Define the **response envelopes** and the status **beacon**
//! - Define **subscription keys** used by the scheduler
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod address;
pub mod attribute;
pub mod beacon;
pub mod channel;
pub mod family;
pub mod request;
pub mod response;
pub mod subscription;
