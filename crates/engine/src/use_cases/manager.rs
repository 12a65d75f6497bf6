//! Entity manager - transactional create/update/delete for one entity kind.
//!
//! A create or update moves through
//! `Started -> Filtered -> Validated -> (Committed | RolledBack)`:
//! the transaction is opened, submitted parameters are filtered to what the
//! attached agent may fill, the result is validated, and then either the
//! entity is written and committed or everything is rolled back.
//!
//! Authorization and validation failures are data ([`MutationResult`]).
//! Persistence faults and wrong-kind entities are [`ManagerError`]s.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lem_domain::{
    AttributeError, DomainError, Entity, EntityId, EntitySchema, ParameterBag, Permission,
};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::infrastructure::ports::{Agent, ClockPort, RepoError, TransactionPort};
use crate::repositories::EntityRepository;
use crate::use_cases::authorization::{Authorizer, SchemaAuthorizer};
use crate::use_cases::deferred::{DeferredFailure, DeferredOp, DeferredQueue};
use crate::use_cases::outcome::{MutationResult, OperationState};
use crate::use_cases::serialization::EntitySerializer;
use crate::use_cases::transaction::TransactionGuard;
use crate::use_cases::validation::{SchemaValidator, Validator};

#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Columns stamped on write when the kind declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampColumns {
    pub created_at: String,
    pub updated_at: String,
}

pub struct Manager {
    schema: Arc<EntitySchema>,
    repository: Arc<EntityRepository>,
    transactions: Arc<dyn TransactionPort>,
    validator: Arc<dyn Validator>,
    authorizer: Arc<dyn Authorizer>,
    serializer: EntitySerializer,
    agent: Option<Arc<dyn Agent>>,
    clock: Arc<dyn ClockPort>,
    timestamps: Option<TimestampColumns>,
    soft_deletes: bool,
    deferred: Mutex<DeferredQueue>,
}

impl Manager {
    /// Manager with the schema-driven validator and authorizer, no agent,
    /// no timestamps, soft deletes on.
    pub fn new(
        repository: Arc<EntityRepository>,
        transactions: Arc<dyn TransactionPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let schema = repository.schema().clone();
        let authorizer: Arc<dyn Authorizer> = Arc::new(SchemaAuthorizer::new(schema.clone()));
        Self {
            validator: Arc::new(SchemaValidator::new(repository.clone())),
            serializer: EntitySerializer::new(schema.clone(), authorizer.clone()),
            authorizer,
            schema,
            repository,
            transactions,
            agent: None,
            clock,
            timestamps: None,
            soft_deletes: true,
            deferred: Mutex::new(DeferredQueue::new()),
        }
    }

    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.serializer = EntitySerializer::new(self.schema.clone(), authorizer.clone());
        self.authorizer = authorizer;
        self
    }

    pub fn with_timestamps(mut self, columns: TimestampColumns) -> Self {
        self.timestamps = Some(columns);
        self
    }

    /// When off, `delete` removes records even for kinds with a soft-delete column.
    pub fn with_soft_deletes(mut self, enabled: bool) -> Self {
        self.soft_deletes = enabled;
        self
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn agent(&self) -> Option<&dyn Agent> {
        self.agent.as_deref()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn create(&self, params: &ParameterBag) -> Result<MutationResult, ManagerError> {
        self.persist(self.repository.new_entity(), params).await
    }

    /// Fill `entity` from `params` and persist it.
    ///
    /// `entity` is replaced by the persisted state only when the update commits.
    pub async fn update(
        &self,
        entity: &mut Entity,
        params: &ParameterBag,
    ) -> Result<MutationResult, ManagerError> {
        self.schema.ensure_kind(entity)?;
        let result = self.persist(entity.clone(), params).await?;
        if let Some(saved) = result.entity() {
            *entity = saved.clone();
        }
        Ok(result)
    }

    /// Return the record exactly matching `params`, creating it if there is none.
    pub async fn find_or_create(
        &self,
        params: &ParameterBag,
    ) -> Result<MutationResult, ManagerError> {
        let criteria = params.only(self.schema.attribute_names());
        if !criteria.is_empty() {
            if let Some(existing) = self.repository.find_one_by(&criteria).await? {
                tracing::debug!(
                    kind = self.schema.kind(),
                    entity_id = %existing.id(),
                    "Found existing entity"
                );
                return Ok(MutationResult::committed(existing));
            }
        }
        self.create(params).await
    }

    /// Update the record matching `criteria`, or create one from `params` alone.
    pub async fn update_or_create(
        &self,
        criteria: &ParameterBag,
        params: &ParameterBag,
    ) -> Result<MutationResult, ManagerError> {
        let criteria = self.repository.filter_parameters(criteria);
        let existing = if criteria.is_empty() {
            None
        } else {
            self.repository.find_one_by(&criteria).await?
        };

        match existing {
            Some(mut entity) => self.update(&mut entity, params).await,
            None => self.create(params).await,
        }
    }

    /// Delete one record. No validation or permission check runs here; see
    /// [`Self::can_delete`].
    pub async fn delete(&self, entity: &Entity) -> Result<(), ManagerError> {
        self.delete_multiple(std::slice::from_ref(entity)).await?;
        Ok(())
    }

    /// Delete every record in one transaction. Returns how many were deleted.
    pub async fn delete_multiple(&self, entities: &[Entity]) -> Result<usize, ManagerError> {
        for entity in entities {
            self.schema.ensure_kind(entity)?;
            if !entity.exists() {
                return Err(RepoError::not_found(self.schema.kind(), entity.id()).into());
            }
        }
        if entities.is_empty() {
            return Ok(0);
        }

        let mut transaction = TransactionGuard::begin(&self.transactions).await?;
        let now = self.clock.now();
        for entity in entities {
            if let Err(err) = self.remove(entity, now).await {
                return Err(self.abort(&mut transaction, err.into()).await);
            }
        }
        if let Err(err) = transaction.commit().await {
            return Err(self.abort(&mut transaction, err.into()).await);
        }

        tracing::info!(
            kind = self.schema.kind(),
            count = entities.len(),
            soft = self.soft_delete_column().is_some(),
            "Entities deleted"
        );
        Ok(entities.len())
    }

    /// Whether the attached agent may remove `entity`. Always true without an agent.
    pub fn can_delete(&self, entity: &Entity) -> bool {
        self.agent()
            .map_or(true, |agent| self.authorizer.can_remove(agent, entity))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find(&self, id: EntityId) -> Result<Option<Entity>, ManagerError> {
        Ok(self.repository.find_one_by_id(id).await?)
    }

    pub async fn find_by(&self, criteria: &ParameterBag) -> Result<Vec<Entity>, ManagerError> {
        Ok(self.repository.find_by(criteria).await?)
    }

    pub async fn find_where_in(
        &self,
        sets: &BTreeMap<String, Vec<Value>>,
    ) -> Result<Vec<Entity>, ManagerError> {
        Ok(self.repository.find_where_in(sets).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Entity>, ManagerError> {
        Ok(self.repository.find_all().await?)
    }

    /// Output representation limited to what the attached agent may see.
    pub fn serialize(&self, entity: &Entity, select: Option<&[&str]>) -> Map<String, Value> {
        self.serializer.serialize(self.agent(), entity, select)
    }

    // =========================================================================
    // Deferred operations
    // =========================================================================

    pub async fn defer<F>(&self, label: impl Into<String>, op: F)
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.deferred.lock().await.push(DeferredOp::new(label, op));
    }

    pub async fn pending_deferred(&self) -> Vec<String> {
        self.deferred.lock().await.labels()
    }

    /// Drain the queue and run everything in it, oldest first.
    pub async fn run_deferred(&self) -> Vec<DeferredFailure> {
        let ops = self.deferred.lock().await.take();
        if ops.is_empty() {
            return Vec::new();
        }

        let total = ops.len();
        let failures = DeferredQueue::run_all(ops);
        tracing::debug!(
            kind = self.schema.kind(),
            total,
            failed = failures.len(),
            "Ran deferred operations"
        );
        failures
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn persist(
        &self,
        mut staged: Entity,
        params: &ParameterBag,
    ) -> Result<MutationResult, ManagerError> {
        let kind = self.schema.kind();
        let entity_id = staged.id();

        let mut transaction = TransactionGuard::begin(&self.transactions).await?;
        tracing::debug!(kind, entity_id = %entity_id, state = %OperationState::Started, "Mutation started");

        let (params, mut errors) = self.filter(&staged, params);
        tracing::debug!(
            kind,
            entity_id = %entity_id,
            state = %OperationState::Filtered,
            attributes = params.len(),
            denied = errors.len(),
            "Parameters filtered"
        );

        match self.validator.validate(&staged, &params).await {
            Ok(validation) => errors.extend(validation),
            Err(err) => return Err(self.abort(&mut transaction, err.into()).await),
        }
        tracing::debug!(
            kind,
            entity_id = %entity_id,
            state = %OperationState::Validated,
            errors = errors.len(),
            "Parameters validated"
        );

        if !errors.is_empty() {
            transaction.rollback().await?;
            tracing::warn!(
                kind,
                entity_id = %entity_id,
                state = %OperationState::RolledBack,
                errors = errors.len(),
                "Mutation rejected"
            );
            return Ok(MutationResult::rolled_back(errors));
        }

        for (name, value) in params.iter() {
            staged.set(name, value.clone());
        }
        self.stamp(&mut staged);

        if let Err(err) = self.repository.save(&staged).await {
            return Err(self.abort(&mut transaction, err.into()).await);
        }
        if let Err(err) = transaction.commit().await {
            return Err(self.abort(&mut transaction, err.into()).await);
        }
        staged.mark_persisted();

        tracing::info!(kind, entity_id = %entity_id, state = %OperationState::Committed, "Mutation committed");
        Ok(MutationResult::committed(staged))
    }

    /// Parameters the agent may fill, plus one error per denied attribute.
    /// Undeclared keys never survive.
    fn filter(&self, entity: &Entity, params: &ParameterBag) -> (ParameterBag, Vec<AttributeError>) {
        match self.agent() {
            Some(agent) => {
                let errors = self.authorizer.authorize(agent, entity, params);
                let writable = self
                    .authorizer
                    .authorized_attributes(agent, Permission::Fill, entity);
                (params.only(&writable), errors)
            }
            None => (params.only(self.schema.attribute_names()), Vec::new()),
        }
    }

    fn stamp(&self, entity: &mut Entity) {
        let Some(columns) = &self.timestamps else {
            return;
        };
        let now = Value::String(self.clock.now().to_rfc3339());

        if !entity.exists() && self.schema.is_declared(&columns.created_at) {
            entity.set(columns.created_at.clone(), now.clone());
        }
        if self.schema.is_declared(&columns.updated_at) {
            entity.set(columns.updated_at.clone(), now);
        }
    }

    fn soft_delete_column(&self) -> Option<&str> {
        self.schema
            .soft_delete_column()
            .filter(|_| self.soft_deletes)
    }

    async fn remove(&self, entity: &Entity, now: DateTime<Utc>) -> Result<(), RepoError> {
        match self.soft_delete_column() {
            Some(column) => {
                // Stamp the stored row, not the caller's copy.
                let mut stored = self
                    .repository
                    .find_stored(entity.id())
                    .await?
                    .ok_or_else(|| RepoError::not_found(self.schema.kind(), entity.id()))?;
                stored.set(column, Value::String(now.to_rfc3339()));
                self.repository.save(&stored).await
            }
            None => self.repository.delete(entity).await,
        }
    }

    /// Roll back after a fatal error and hand the error back.
    async fn abort(
        &self,
        transaction: &mut TransactionGuard,
        error: ManagerError,
    ) -> ManagerError {
        if let Err(rollback) = transaction.rollback().await {
            tracing::error!(kind = self.schema.kind(), error = %rollback, "Rollback failed");
        }
        tracing::error!(
            kind = self.schema.kind(),
            state = %OperationState::RolledBack,
            error = %error,
            "Mutation aborted"
        );
        error
    }
}
