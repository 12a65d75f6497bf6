//! Persistence port traits.
//!
//! The backend is an external collaborator: the engine only needs a
//! transaction boundary and query-by-criteria over entity records.

use async_trait::async_trait;
use lem_domain::{Entity, EntityId, Query};

use super::error::RepoError;

// =============================================================================
// Record Storage
// =============================================================================

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Records matching every filter of `query`, in storage order.
    async fn fetch(&self, query: &Query) -> Result<Vec<Entity>, RepoError>;

    async fn count(&self, query: &Query) -> Result<usize, RepoError>;

    /// Insert or replace by identity. Stored records always read back as persisted.
    async fn save(&self, entity: &Entity) -> Result<(), RepoError>;

    /// Hard removal. Removing an absent record is `NotFound`.
    async fn remove(&self, kind: &str, id: EntityId) -> Result<(), RepoError>;
}

// =============================================================================
// Transaction Boundary
// =============================================================================

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TransactionPort: Send + Sync {
    async fn begin(&self) -> Result<(), RepoError>;
    async fn commit(&self) -> Result<(), RepoError>;
    async fn rollback(&self) -> Result<(), RepoError>;
}
