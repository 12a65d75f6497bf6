//! Per-attribute permission checks.

use std::collections::BTreeSet;
use std::sync::Arc;

use lem_domain::{AttributeError, Entity, EntitySchema, ParameterBag, Permission};

use crate::infrastructure::ports::Agent;

pub trait Authorizer: Send + Sync {
    /// One `NotAuthorized` error per submitted attribute the agent may not fill.
    fn authorize(
        &self,
        agent: &dyn Agent,
        entity: &Entity,
        params: &ParameterBag,
    ) -> Vec<AttributeError>;

    /// Attributes whose `permission` token the agent holds for `entity`.
    fn authorized_attributes(
        &self,
        agent: &dyn Agent,
        permission: Permission,
        entity: &Entity,
    ) -> BTreeSet<String>;

    fn can_remove(&self, agent: &dyn Agent, entity: &Entity) -> bool;
}

/// Authorizer reading permission tokens from the schema.
pub struct SchemaAuthorizer {
    schema: Arc<EntitySchema>,
}

impl SchemaAuthorizer {
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self { schema }
    }
}

impl Authorizer for SchemaAuthorizer {
    fn authorize(
        &self,
        agent: &dyn Agent,
        entity: &Entity,
        params: &ParameterBag,
    ) -> Vec<AttributeError> {
        let kind = self.schema.kind();
        self.schema
            .attributes()
            .iter()
            .filter_map(|attribute| {
                let value = params.get(attribute.name())?;
                let token = attribute.permission(Permission::Fill);
                (!agent.can(token, Some(entity))).then(|| {
                    AttributeError::not_authorized(kind, attribute.name(), value.clone())
                })
            })
            .collect()
    }

    fn authorized_attributes(
        &self,
        agent: &dyn Agent,
        permission: Permission,
        entity: &Entity,
    ) -> BTreeSet<String> {
        self.schema
            .attributes()
            .iter()
            .filter(|a| agent.can(a.permission(permission), Some(entity)))
            .map(|a| a.name().to_string())
            .collect()
    }

    fn can_remove(&self, agent: &dyn Agent, entity: &Entity) -> bool {
        agent.can(self.schema.remove_permission(), Some(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::agents::{GuestAgent, PrincipalAgent, StaticPolicy};
    use crate::test_fixtures;
    use lem_domain::{AgentId, ErrorKind};

    fn editor() -> PrincipalAgent {
        let policy = StaticPolicy::granting(["user.attributes.*"])
            .except(["user.attributes.role.fill", "user.attributes.password.show"]);
        PrincipalAgent::new(AgentId::new(), Arc::new(policy))
    }

    #[test]
    fn reports_every_unfillable_submitted_attribute() {
        let authorizer = SchemaAuthorizer::new(test_fixtures::user_schema());
        let params = ParameterBag::new()
            .with("username", "alice")
            .with("role", "admin")
            .with("undeclared", "ignored");

        let errors = authorizer.authorize(&editor(), &Entity::new("user"), &params);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].attribute(), "role");
        assert_eq!(errors[0].kind(), ErrorKind::NotAuthorized);
        assert_eq!(errors[0].code(), "USER_ROLE_NOT_AUTHORIZED");

        let guest_errors = authorizer.authorize(&GuestAgent, &Entity::new("user"), &params);
        assert_eq!(guest_errors.len(), 2);
    }

    #[test]
    fn authorized_attributes_follow_the_requested_permission() {
        let authorizer = SchemaAuthorizer::new(test_fixtures::user_schema());
        let entity = Entity::new("user");

        let fillable = authorizer.authorized_attributes(&editor(), Permission::Fill, &entity);
        assert!(fillable.contains("username"));
        assert!(!fillable.contains("role"));

        let visible = authorizer.authorized_attributes(&editor(), Permission::Show, &entity);
        assert!(visible.contains("role"));
        assert!(!visible.contains("password"));

        assert!(authorizer
            .authorized_attributes(&GuestAgent, Permission::Show, &entity)
            .is_empty());
    }

    #[test]
    fn removal_uses_the_kind_remove_token() {
        let authorizer = SchemaAuthorizer::new(test_fixtures::user_schema());
        let entity = Entity::new("user");
        let admin = PrincipalAgent::new(AgentId::new(), Arc::new(StaticPolicy::granting(["user.remove"])));

        assert!(authorizer.can_remove(&admin, &entity));
        assert!(!authorizer.can_remove(&editor(), &entity));
    }
}
