//! Operator identity, availability state and registry.
//!
//! The registry is the authoritative source of operator availability. The
//! routing engine owns the ONLINE↔BUSY transitions; presence toggles
//! (sign-in/sign-out) arrive from the surrounding system as advisory input.

pub mod registry;
pub mod types;

pub use registry::{InMemoryOperatorRegistry, OperatorRegistry, RegistryStats};
pub use types::{Availability, OperatorId};
