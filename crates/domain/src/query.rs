//! Query value objects.
//!
//! A [`Query`] is a conjunction of [`Filter`]s over one entity kind. Stores
//! evaluate it; scopes append to it before it reaches the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::Entity;
use crate::ids::EntityId;

/// A single predicate over an entity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Field equals value (`null` matches absent fields)
    Equals { field: String, value: Value },
    /// Field value is a member of the set
    In { field: String, values: Vec<Value> },
    /// Field is absent or `null`
    IsNull(String),
    /// Field is present and not `null`
    NotNull(String),
    /// Excludes one identity (uniqueness checks skip the entity being edited)
    NotId(EntityId),
}

impl Filter {
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Self::Equals { field, value } => entity.lookup(field) == *value,
            Self::In { field, values } => {
                let current = entity.lookup(field);
                values.iter().any(|v| *v == current)
            }
            Self::IsNull(field) => entity.lookup(field).is_null(),
            Self::NotNull(field) => !entity.lookup(field).is_null(),
            Self::NotId(id) => entity.id() != *id,
        }
    }
}

/// Conjunction of filters over one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    kind: String,
    filters: Vec<Filter>,
    limit: Option<usize>,
}

impl Query {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: Value) -> Self {
        self.filter(Filter::Equals {
            field: field.into(),
            value,
        })
    }

    pub fn where_in(self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.filter(Filter::In {
            field: field.into(),
            values,
        })
    }

    pub fn exclude_id(self, id: EntityId) -> Self {
        self.filter(Filter::NotId(id))
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `entity` satisfies every filter (kind included).
    pub fn matches(&self, entity: &Entity) -> bool {
        entity.kind() == self.kind && self.filters.iter().all(|f| f.matches(entity))
    }
}
