//! Read-side projection of entities.

use std::sync::Arc;

use lem_domain::{Entity, EntitySchema, Permission};
use serde_json::{Map, Value};

use crate::infrastructure::ports::Agent;
use crate::use_cases::authorization::Authorizer;

/// Projects an entity onto the attributes the viewing agent may see.
pub struct EntitySerializer {
    schema: Arc<EntitySchema>,
    authorizer: Arc<dyn Authorizer>,
}

impl EntitySerializer {
    pub fn new(schema: Arc<EntitySchema>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { schema, authorizer }
    }

    /// Entity fields ∩ `select` ∩ attributes visible to `agent`.
    ///
    /// Without an agent every declared attribute is visible. `select = None`
    /// means no restriction.
    pub fn serialize(
        &self,
        agent: Option<&dyn Agent>,
        entity: &Entity,
        select: Option<&[&str]>,
    ) -> Map<String, Value> {
        let visible = agent.map(|agent| {
            self.authorizer
                .authorized_attributes(agent, Permission::Show, entity)
        });

        entity
            .fields()
            .iter()
            .filter(|(name, _)| self.schema.is_declared(name))
            .filter(|(name, _)| select.map_or(true, |s| s.contains(&name.as_str())))
            .filter(|(name, _)| visible.as_ref().map_or(true, |v| v.contains(name.as_str())))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::agents::{GuestAgent, PrincipalAgent, StaticPolicy};
    use crate::test_fixtures;
    use crate::use_cases::authorization::SchemaAuthorizer;
    use lem_domain::AgentId;
    use serde_json::json;

    fn serializer() -> EntitySerializer {
        let schema = test_fixtures::user_schema();
        EntitySerializer::new(schema.clone(), Arc::new(SchemaAuthorizer::new(schema)))
    }

    fn alice() -> Entity {
        let mut entity = Entity::new("user");
        entity.set("username", json!("alice"));
        entity.set("email", json!("alice@example.com"));
        entity.set("password", json!("hunter2hunter2"));
        entity
    }

    #[test]
    fn hides_attributes_the_agent_cannot_show() {
        let viewer = PrincipalAgent::new(
            AgentId::new(),
            Arc::new(
                StaticPolicy::granting(["user.attributes.*"])
                    .except(["user.attributes.password.show"]),
            ),
        );
        let output = serializer().serialize(Some(&viewer), &alice(), None);

        assert_eq!(output.get("username"), Some(&json!("alice")));
        assert!(output.contains_key("email"));
        assert!(!output.contains_key("password"));
    }

    #[test]
    fn select_narrows_the_output() {
        let entity = alice();
        let before = entity.clone();

        let output = serializer().serialize(None, &entity, Some(&["username", "role"]));
        assert_eq!(output.len(), 1);
        assert_eq!(output.get("username"), Some(&json!("alice")));
        assert_eq!(entity, before);
    }

    #[test]
    fn guest_sees_nothing() {
        assert!(serializer()
            .serialize(Some(&GuestAgent), &alice(), None)
            .is_empty());
    }
}
