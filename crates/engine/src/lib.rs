//! Lem Engine library.
//!
//! Generic entity-mutation pipeline: decides which submitted fields an agent
//! may touch, validates the resulting state, and commits it atomically.
//!
//! ## Structure
//!
//! - `repositories/` - Scoped data access per entity kind
//! - `use_cases/` - Validator, authorizer, serializer and the transactional manager
//! - `infrastructure/` - Ports, adapters, settings and logging
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

/// Shared schemas and wiring for unit tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
pub use use_cases::{Manager, ManagerError, MutationResult};
