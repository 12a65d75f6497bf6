//! Entity repository - scoped data access for one entity kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use lem_domain::{Entity, EntityId, EntitySchema, ParameterBag, Query};
use serde_json::Value;

use crate::infrastructure::ports::{EntityStore, RepoError};
use crate::repositories::ScopeRegistry;

/// Wraps an [`EntityStore`] for one schema.
///
/// Every query built here goes through the registered scopes. Criteria keys
/// are restricted to declared attributes plus `id`.
pub struct EntityRepository {
    schema: Arc<EntitySchema>,
    store: Arc<dyn EntityStore>,
    scopes: Arc<ScopeRegistry>,
}

impl EntityRepository {
    pub fn new(
        schema: Arc<EntitySchema>,
        store: Arc<dyn EntityStore>,
        scopes: Arc<ScopeRegistry>,
    ) -> Self {
        Self {
            schema,
            store,
            scopes,
        }
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    pub fn new_entity(&self) -> Entity {
        self.schema.new_entity()
    }

    /// A fresh query over this kind with every scope applied.
    pub fn get_query(&self) -> Query {
        let mut query = Query::new(self.schema.kind());
        self.apply_scopes(&mut query);
        query
    }

    pub fn apply_scopes(&self, query: &mut Query) {
        self.scopes.apply(&self.schema, query);
    }

    /// Keep only keys that name a declared attribute or `id`.
    pub fn filter_parameters(&self, params: &ParameterBag) -> ParameterBag {
        params.only(std::iter::once("id").chain(self.schema.attribute_names()))
    }

    pub async fn find_all(&self) -> Result<Vec<Entity>, RepoError> {
        self.store.fetch(&self.get_query()).await
    }

    pub async fn find_by(&self, criteria: &ParameterBag) -> Result<Vec<Entity>, RepoError> {
        self.store.fetch(&self.criteria_query(criteria)).await
    }

    pub async fn find_one_by(&self, criteria: &ParameterBag) -> Result<Option<Entity>, RepoError> {
        let query = self.criteria_query(criteria).take(1);
        Ok(self.store.fetch(&query).await?.into_iter().next())
    }

    pub async fn find_one_by_id(&self, id: EntityId) -> Result<Option<Entity>, RepoError> {
        let query = self
            .get_query()
            .where_eq("id", Value::String(id.to_string()))
            .take(1);
        Ok(self.store.fetch(&query).await?.into_iter().next())
    }

    /// The stored record with this id, soft-deleted or not.
    pub async fn find_stored(&self, id: EntityId) -> Result<Option<Entity>, RepoError> {
        let query = Query::new(self.schema.kind())
            .where_eq("id", Value::String(id.to_string()))
            .take(1);
        Ok(self.store.fetch(&query).await?.into_iter().next())
    }

    /// Records whose field value is in the given set, for every field in `sets`.
    pub async fn find_where_in(
        &self,
        sets: &BTreeMap<String, Vec<Value>>,
    ) -> Result<Vec<Entity>, RepoError> {
        let query = sets
            .iter()
            .filter(|(field, _)| self.is_criteria_key(field))
            .fold(self.get_query(), |query, (field, values)| {
                query.where_in(field.as_str(), values.clone())
            });
        self.store.fetch(&query).await
    }

    pub async fn count(&self) -> Result<usize, RepoError> {
        self.store.count(&self.get_query()).await
    }

    pub async fn count_by(&self, criteria: &ParameterBag) -> Result<usize, RepoError> {
        self.store.count(&self.criteria_query(criteria)).await
    }

    /// Run an already-built query. Callers start from [`Self::get_query`].
    pub async fn fetch(&self, query: &Query) -> Result<Vec<Entity>, RepoError> {
        self.store.fetch(query).await
    }

    pub async fn count_matching(&self, query: &Query) -> Result<usize, RepoError> {
        self.store.count(query).await
    }

    pub async fn save(&self, entity: &Entity) -> Result<(), RepoError> {
        self.store.save(entity).await
    }

    /// Physically remove the record, bypassing soft deletes.
    pub async fn delete(&self, entity: &Entity) -> Result<(), RepoError> {
        self.store.remove(self.schema.kind(), entity.id()).await
    }

    fn is_criteria_key(&self, key: &str) -> bool {
        key == "id" || self.schema.is_declared(key)
    }

    fn criteria_query(&self, criteria: &ParameterBag) -> Query {
        self.filter_parameters(criteria)
            .iter()
            .fold(self.get_query(), |query, (field, value)| {
                query.where_eq(field, value.clone())
            })
    }
}
