//! Lem domain - the pure vocabulary of the entity-mutation pipeline.
//!
//! Nothing here performs I/O. Persistence, agents and orchestration live in
//! `lem-engine`; this crate only defines what they exchange.

pub mod attribute;
pub mod attribute_error;
pub mod entity;
pub mod error;
pub mod ids;
pub mod parameter_bag;
pub mod query;
pub mod schema;

pub use attribute::{AttributeDescriptor, Permission, Predicate, Rule};
pub use attribute_error::{AttributeError, ErrorKind};
pub use entity::Entity;
pub use error::DomainError;
pub use ids::{AgentId, EntityId};
pub use parameter_bag::ParameterBag;
pub use query::{Filter, Query};
pub use schema::{EntitySchema, EntitySchemaBuilder};
