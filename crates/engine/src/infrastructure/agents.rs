//! Agent implementations.
//!
//! - [`GuestAgent`] - anonymous principal, denies everything
//! - [`PrincipalAgent`] - authenticated principal, asks a [`PolicySource`]
//! - [`StaticPolicy`] - grant list with trailing `*` wildcards

use std::collections::BTreeSet;
use std::sync::Arc;

use lem_domain::{AgentId, Entity};
use uuid::Uuid;

use crate::infrastructure::ports::{Agent, PolicySource};

/// Anonymous principal. Its identity is the nil id.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestAgent;

impl Agent for GuestAgent {
    fn id(&self) -> AgentId {
        AgentId::from_uuid(Uuid::nil())
    }

    fn can(&self, _permission: &str, _subject: Option<&Entity>) -> bool {
        false
    }
}

/// Authenticated principal whose grants live in a policy source.
pub struct PrincipalAgent {
    id: AgentId,
    policy: Arc<dyn PolicySource>,
}

impl PrincipalAgent {
    pub fn new(id: AgentId, policy: Arc<dyn PolicySource>) -> Self {
        Self { id, policy }
    }
}

impl Agent for PrincipalAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn can(&self, permission: &str, subject: Option<&Entity>) -> bool {
        let allowed = self.policy.allows(self.id, permission, subject);
        if !allowed {
            tracing::trace!(agent_id = %self.id, permission, "Permission denied");
        }
        allowed
    }
}

/// Fixed grant list shared by every agent that consults it.
///
/// A grant matches a token exactly, or as a prefix when it ends in `*`
/// (`"user.attributes.*"`, or `"*"` for everything). Denials always win.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicy {
    grants: BTreeSet<String>,
    denials: BTreeSet<String>,
}

impl StaticPolicy {
    pub fn granting<I, S>(grants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            grants: grants.into_iter().map(Into::into).collect(),
            denials: BTreeSet::new(),
        }
    }

    pub fn allow_all() -> Self {
        Self::granting(["*"])
    }

    pub fn except<I, S>(mut self, denials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denials.extend(denials.into_iter().map(Into::into));
        self
    }

    fn covers(set: &BTreeSet<String>, permission: &str) -> bool {
        set.iter().any(|grant| match grant.strip_suffix('*') {
            Some(prefix) => permission.starts_with(prefix),
            None => grant == permission,
        })
    }
}

impl PolicySource for StaticPolicy {
    fn allows(&self, _agent: AgentId, permission: &str, _subject: Option<&Entity>) -> bool {
        Self::covers(&self.grants, permission) && !Self::covers(&self.denials, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_denies_everything() {
        let guest = GuestAgent;
        assert!(!guest.can("*", None));
        assert!(!guest.can("user.attributes.name.fill", Some(&Entity::new("user"))));
        assert!(guest.id().as_uuid().is_nil());
    }

    #[test]
    fn principal_delegates_to_policy() {
        let policy = StaticPolicy::granting(["user.attributes.*"]).except(["user.attributes.role.fill"]);
        let agent = PrincipalAgent::new(AgentId::new(), Arc::new(policy));

        assert!(agent.can("user.attributes.name.fill", None));
        assert!(agent.can("user.attributes.role.show", None));
        assert!(!agent.can("user.attributes.role.fill", None));
        assert!(!agent.can("user.remove", None));
    }

    #[test]
    fn allow_all_matches_any_token() {
        let policy = StaticPolicy::allow_all();
        assert!(policy.allows(AgentId::new(), "article.remove", None));
    }
}
