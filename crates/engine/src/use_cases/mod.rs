//! Use cases - the entity-mutation pipeline.
//!
//! [`Manager`] orchestrates the [`Authorizer`], [`Validator`] and
//! [`EntitySerializer`] around an [`EntityRepository`](crate::repositories::EntityRepository)
//! and a transaction boundary.

pub mod authorization;
pub mod deferred;
pub mod manager;
pub mod outcome;
pub mod serialization;
mod transaction;
pub mod validation;

pub use authorization::{Authorizer, SchemaAuthorizer};
pub use deferred::{DeferredFailure, DeferredOp, DeferredQueue};
pub use manager::{Manager, ManagerError, TimestampColumns};
pub use outcome::{MutationResult, OperationState};
pub use serialization::EntitySerializer;
pub use validation::{SchemaValidator, Validator};
