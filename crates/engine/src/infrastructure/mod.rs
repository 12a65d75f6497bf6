//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod agents;
pub mod clock;
pub mod logging;
pub mod memory;
pub mod ports;
pub mod settings;
