//! Port traits for infrastructure boundaries.
//!
//! Ports exist for:
//! - Record storage and the transaction boundary (could swap memory -> Postgres)
//! - Capability checks (agents and their policy sources)
//! - Clock (for testing)

mod agent;
mod error;
mod repos;
mod testing;

pub use agent::{Agent, PolicySource};
pub use error::RepoError;
pub use repos::{EntityStore, TransactionPort};
pub use testing::ClockPort;

#[cfg(any(test, feature = "testing"))]
pub use repos::{MockEntityStore, MockTransactionPort};
#[cfg(any(test, feature = "testing"))]
pub use testing::MockClockPort;
