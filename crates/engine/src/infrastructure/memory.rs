//! In-memory persistence adapter.
//!
//! Implements both [`EntityStore`] and [`TransactionPort`]. Transactions are
//! serialized: `begin` waits for the previous transaction to finish, takes a
//! snapshot, and `rollback` restores it. Reads and writes outside a
//! transaction are applied directly.

use std::sync::Arc;

use async_trait::async_trait;
use lem_domain::{Entity, EntityId, Query};
use tokio::sync::{Mutex, OwnedSemaphorePermit, RwLock, Semaphore};

use crate::infrastructure::ports::{EntityStore, RepoError, TransactionPort};

struct ActiveTransaction {
    snapshot: Vec<Entity>,
    _permit: OwnedSemaphorePermit,
}

pub struct InMemoryStore {
    /// Insertion order is storage order.
    records: RwLock<Vec<Entity>>,
    gate: Arc<Semaphore>,
    active: Mutex<Option<ActiveTransaction>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            gate: Arc::new(Semaphore::new(1)),
            active: Mutex::new(None),
        }
    }

    /// Every stored record of `kind`, ignoring scopes. Test helper.
    pub async fn records_of(&self, kind: &str) -> Vec<Entity> {
        self.records
            .read()
            .await
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    pub async fn in_transaction(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn fetch(&self, query: &Query) -> Result<Vec<Entity>, RepoError> {
        let records = self.records.read().await;
        let matching = records.iter().filter(|e| query.matches(e)).cloned();
        Ok(match query.limit() {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn count(&self, query: &Query) -> Result<usize, RepoError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|e| query.matches(e)).count())
    }

    async fn save(&self, entity: &Entity) -> Result<(), RepoError> {
        let mut stored = entity.clone();
        stored.mark_persisted();

        let mut records = self.records.write().await;
        match records.iter_mut().find(|e| e.id() == stored.id()) {
            Some(existing) => {
                if existing.kind() != stored.kind() {
                    return Err(RepoError::database(
                        "save",
                        format!("id {} already belongs to a {}", stored.id(), existing.kind()),
                    ));
                }
                *existing = stored;
            }
            None => records.push(stored),
        }
        Ok(())
    }

    async fn remove(&self, kind: &str, id: EntityId) -> Result<(), RepoError> {
        let mut records = self.records.write().await;
        let position = records
            .iter()
            .position(|e| e.id() == id && e.kind() == kind)
            .ok_or_else(|| RepoError::not_found(kind, id))?;
        records.remove(position);
        Ok(())
    }
}

#[async_trait]
impl TransactionPort for InMemoryStore {
    async fn begin(&self) -> Result<(), RepoError> {
        let permit = self
            .gate
            .clone()
            .acquire_owned()
            .await
            .map_err(RepoError::transaction)?;
        let snapshot = self.records.read().await.clone();
        *self.active.lock().await = Some(ActiveTransaction {
            snapshot,
            _permit: permit,
        });
        Ok(())
    }

    async fn commit(&self) -> Result<(), RepoError> {
        self.active
            .lock()
            .await
            .take()
            .map(|_| ())
            .ok_or_else(|| RepoError::transaction("commit without an active transaction"))
    }

    async fn rollback(&self) -> Result<(), RepoError> {
        let active = self
            .active
            .lock()
            .await
            .take()
            .ok_or_else(|| RepoError::transaction("rollback without an active transaction"))?;
        *self.records.write().await = active.snapshot;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(name: &str) -> Entity {
        let mut entity = Entity::new("user");
        entity.set("name", json!(name));
        entity
    }

    #[tokio::test]
    async fn save_upserts_and_marks_persisted() {
        let store = InMemoryStore::new();
        let mut alice = user("alice");
        store.save(&alice).await.unwrap();

        alice.set("name", json!("alicia"));
        store.save(&alice).await.unwrap();

        let records = store.records_of("user").await;
        assert_eq!(records.len(), 1);
        assert!(records[0].exists());
        assert_eq!(records[0].get("name"), Some(&json!("alicia")));
    }

    #[tokio::test]
    async fn fetch_applies_filters_and_limit() {
        let store = InMemoryStore::new();
        for name in ["alice", "bob", "carol"] {
            store.save(&user(name)).await.unwrap();
        }

        let query = Query::new("user").where_in("name", vec![json!("bob"), json!("carol")]);
        assert_eq!(store.fetch(&query).await.unwrap().len(), 2);
        assert_eq!(store.count(&query).await.unwrap(), 2);
        assert_eq!(store.fetch(&query.take(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rollback_restores_the_snapshot() {
        let store = InMemoryStore::new();
        store.save(&user("alice")).await.unwrap();

        store.begin().await.unwrap();
        assert!(store.in_transaction().await);
        store.save(&user("bob")).await.unwrap();
        store.rollback().await.unwrap();

        let names: Vec<_> = store
            .records_of("user")
            .await
            .iter()
            .map(|e| e.get("name").cloned())
            .collect();
        assert_eq!(names, vec![Some(json!("alice"))]);
        assert!(!store.in_transaction().await);
    }

    #[tokio::test]
    async fn commit_keeps_writes() {
        let store = InMemoryStore::new();
        store.begin().await.unwrap();
        store.save(&user("alice")).await.unwrap();
        store.commit().await.unwrap();

        assert_eq!(store.records_of("user").await.len(), 1);
    }

    #[tokio::test]
    async fn commit_without_begin_is_an_error() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.commit().await,
            Err(RepoError::Transaction(_))
        ));
    }

    #[tokio::test]
    async fn remove_missing_record_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.remove("user", EntityId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
