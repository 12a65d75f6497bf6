//! Query scopes - filters every repository applies to every query.

use std::sync::{Arc, PoisonError, RwLock};

use lem_domain::{EntitySchema, Filter, Query};

pub trait Scope: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, schema: &EntitySchema, query: &mut Query);
}

/// Hides soft-deleted rows of kinds that declare a soft-delete column.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftDeleteScope;

impl SoftDeleteScope {
    pub const NAME: &'static str = "soft_deletes";
}

impl Scope for SoftDeleteScope {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, schema: &EntitySchema, query: &mut Query) {
        if let Some(column) = schema.soft_delete_column() {
            query.push(Filter::IsNull(column.to_string()));
        }
    }
}

/// Registered scopes, applied in registration order.
///
/// Shared by every repository of an [`App`](crate::app::App). Scopes are
/// normally registered at startup; the lock only matters for runtime
/// registration.
#[derive(Default)]
pub struct ScopeRegistry {
    scopes: RwLock<Vec<Arc<dyn Scope>>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scope. Returns `false` if one with the same name is already present.
    pub fn add(&self, scope: Arc<dyn Scope>) -> bool {
        let mut scopes = self.scopes.write().unwrap_or_else(PoisonError::into_inner);
        if scopes.iter().any(|s| s.name() == scope.name()) {
            return false;
        }
        tracing::debug!(scope = scope.name(), "Registered query scope");
        scopes.push(scope);
        true
    }

    pub fn names(&self) -> Vec<String> {
        self.scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn apply(&self, schema: &EntitySchema, query: &mut Query) {
        let scopes = self.scopes.read().unwrap_or_else(PoisonError::into_inner);
        for scope in scopes.iter() {
            scope.apply(schema, query);
        }
    }

    /// Drop every registered scope.
    #[cfg(any(test, feature = "testing"))]
    pub fn reset(&self) {
        self.scopes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
