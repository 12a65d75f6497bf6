//! Entity schemas - the descriptor table of one entity kind.
//!
//! A schema is built once at startup and shared read-only (`Arc<EntitySchema>`)
//! by every repository, validator, authorizer and manager of that kind.

use crate::attribute::AttributeDescriptor;
use crate::entity::Entity;
use crate::error::DomainError;

/// Names the engine manages itself; they cannot be declared as attributes.
const RESERVED: &[&str] = &["id"];

#[derive(Debug, Clone)]
pub struct EntitySchema {
    kind: String,
    attributes: Vec<AttributeDescriptor>,
    soft_delete_column: Option<String>,
    remove_permission: String,
}

impl EntitySchema {
    pub fn builder(kind: impl Into<String>) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            kind: kind.into(),
            attributes: Vec::new(),
            soft_delete_column: None,
            remove_permission: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(AttributeDescriptor::name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Column set instead of removing the record, when the kind soft-deletes.
    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete_column.as_deref()
    }

    /// Token checked before removing a record of this kind.
    pub fn remove_permission(&self) -> &str {
        &self.remove_permission
    }

    pub fn new_entity(&self) -> Entity {
        Entity::new(self.kind.clone())
    }

    pub fn ensure_kind(&self, entity: &Entity) -> Result<(), DomainError> {
        if entity.kind() != self.kind {
            return Err(DomainError::kind_mismatch(&self.kind, entity.kind()));
        }
        Ok(())
    }
}

pub struct EntitySchemaBuilder {
    kind: String,
    attributes: Vec<AttributeDescriptor>,
    soft_delete_column: Option<String>,
    remove_permission: Option<String>,
}

impl EntitySchemaBuilder {
    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Soft-delete through `column`, which must be a declared nullable attribute.
    pub fn soft_deletes(mut self, column: impl Into<String>) -> Self {
        self.soft_delete_column = Some(column.into());
        self
    }

    pub fn remove_permission(mut self, token: impl Into<String>) -> Self {
        self.remove_permission = Some(token.into());
        self
    }

    pub fn build(self) -> Result<EntitySchema, DomainError> {
        if self.kind.trim().is_empty() {
            return Err(DomainError::invalid_schema(&self.kind, "kind cannot be empty"));
        }

        let mut attributes = Vec::with_capacity(self.attributes.len());
        for mut attribute in self.attributes {
            if RESERVED.contains(&attribute.name()) {
                return Err(DomainError::invalid_schema(
                    &self.kind,
                    format!("reserved attribute name: {}", attribute.name()),
                ));
            }
            if attributes
                .iter()
                .any(|a: &AttributeDescriptor| a.name() == attribute.name())
            {
                return Err(DomainError::invalid_schema(
                    &self.kind,
                    format!("duplicate attribute: {}", attribute.name()),
                ));
            }
            attribute.resolve_permissions(&self.kind);
            attributes.push(attribute);
        }

        if let Some(column) = &self.soft_delete_column {
            let declared = attributes
                .iter()
                .find(|a: &&AttributeDescriptor| a.name() == column.as_str());
            if !declared.is_some_and(AttributeDescriptor::is_nullable) {
                return Err(DomainError::invalid_schema(
                    &self.kind,
                    format!("soft delete column {} must be a nullable attribute", column),
                ));
            }
        }

        let remove_permission = self
            .remove_permission
            .unwrap_or_else(|| format!("{}.remove", self.kind));

        Ok(EntitySchema {
            kind: self.kind,
            attributes,
            soft_delete_column: self.soft_delete_column,
            remove_permission,
        })
    }
}
