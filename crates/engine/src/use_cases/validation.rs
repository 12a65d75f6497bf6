//! Business-rule validation of submitted parameters.

use std::sync::Arc;

use async_trait::async_trait;
use lem_domain::{AttributeError, Entity, EntitySchema, ParameterBag};

use crate::infrastructure::ports::RepoError;
use crate::repositories::EntityRepository;

/// Checks submitted parameters against an entity kind's rules.
///
/// Errors are collected, never short-circuited. `Err` is reserved for
/// persistence faults hit while checking uniqueness.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(
        &self,
        entity: &Entity,
        params: &ParameterBag,
    ) -> Result<Vec<AttributeError>, RepoError>;
}

/// Validator driven entirely by the schema's attribute descriptors.
pub struct SchemaValidator {
    repository: Arc<EntityRepository>,
}

impl SchemaValidator {
    pub fn new(repository: Arc<EntityRepository>) -> Self {
        Self { repository }
    }

    fn schema(&self) -> &EntitySchema {
        self.repository.schema()
    }

    /// Required attributes missing from `params`, in declaration order.
    pub fn validate_required(&self, params: &ParameterBag) -> Vec<AttributeError> {
        let kind = self.schema().kind();
        self.schema()
            .attributes()
            .iter()
            .filter(|a| a.is_required() && !params.exists(a.name()))
            .map(|a| AttributeError::not_defined(kind, a.name()))
            .collect()
    }

    /// Shape and uniqueness of every submitted attribute, in declaration order.
    ///
    /// An attribute that fails its rule is not checked for uniqueness.
    pub async fn validate_value(
        &self,
        entity: &Entity,
        params: &ParameterBag,
    ) -> Result<Vec<AttributeError>, RepoError> {
        let kind = self.schema().kind();
        let mut errors = Vec::new();

        for attribute in self.schema().attributes() {
            let Some(value) = params.get(attribute.name()) else {
                continue;
            };

            if !attribute.is_valid(entity, value) {
                errors.push(AttributeError::not_valid(kind, attribute.name(), value.clone()));
                continue;
            }

            if attribute.is_unique() && !value.is_null() {
                let query = self
                    .repository
                    .get_query()
                    .where_eq(attribute.name(), value.clone())
                    .exclude_id(entity.id());
                if self.repository.count_matching(&query).await? > 0 {
                    errors.push(AttributeError::not_unique(kind, attribute.name(), value.clone()));
                }
            }
        }

        Ok(errors)
    }
}

#[async_trait]
impl Validator for SchemaValidator {
    /// Required checks run only for entities that have not been persisted yet.
    async fn validate(
        &self,
        entity: &Entity,
        params: &ParameterBag,
    ) -> Result<Vec<AttributeError>, RepoError> {
        let mut errors = if entity.exists() {
            Vec::new()
        } else {
            self.validate_required(params)
        };
        errors.extend(self.validate_value(entity, params).await?);
        Ok(errors)
    }
}
