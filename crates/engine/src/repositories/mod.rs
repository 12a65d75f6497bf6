//! Repository modules - Data access wrappers around port traits.
//!
//! [`EntityRepository`] wraps the [`EntityStore`](crate::infrastructure::ports::EntityStore)
//! port for one schema and routes every query through the [`ScopeRegistry`].

pub mod entity;
pub mod scope;

pub use entity::EntityRepository;
pub use scope::{Scope, ScopeRegistry, SoftDeleteScope};
