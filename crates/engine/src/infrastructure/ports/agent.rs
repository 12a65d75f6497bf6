//! Capability-check ports.
//!
//! How a principal was authenticated is someone else's business; the engine
//! only asks an [`Agent`] whether it holds a permission token, optionally
//! against a subject entity.

use lem_domain::{AgentId, Entity};

pub trait Agent: Send + Sync {
    fn id(&self) -> AgentId;

    fn can(&self, permission: &str, subject: Option<&Entity>) -> bool;
}

/// Where an authenticated principal's grants come from.
pub trait PolicySource: Send + Sync {
    fn allows(&self, agent: AgentId, permission: &str, subject: Option<&Entity>) -> bool;
}
