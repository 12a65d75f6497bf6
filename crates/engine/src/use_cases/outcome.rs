//! Mutation outcomes.

use std::fmt;

use lem_domain::{AttributeError, Entity};
use serde::Serialize;

/// Stages a create/update passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Started,
    Filtered,
    Validated,
    Committed,
    RolledBack,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Started => "started",
            Self::Filtered => "filtered",
            Self::Validated => "validated",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// Outcome of a create or update.
///
/// Either a persisted entity and no errors, or errors and no entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationResult {
    errors: Vec<AttributeError>,
    entity: Option<Entity>,
}

impl MutationResult {
    pub fn committed(entity: Entity) -> Self {
        Self {
            errors: Vec::new(),
            entity: Some(entity),
        }
    }

    pub fn rolled_back(errors: Vec<AttributeError>) -> Self {
        Self {
            errors,
            entity: None,
        }
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[AttributeError] {
        &self.errors
    }

    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    pub fn into_entity(self) -> Option<Entity> {
        self.entity
    }

    /// First error reported for `attribute`.
    pub fn error_for(&self, attribute: &str) -> Option<&AttributeError> {
        self.errors.iter().find(|e| e.attribute() == attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_tracks_errors() {
        let committed = MutationResult::committed(Entity::new("user"));
        assert!(committed.ok());
        assert!(committed.entity().is_some());

        let rolled_back =
            MutationResult::rolled_back(vec![AttributeError::not_valid("user", "name", json!("ab"))]);
        assert!(!rolled_back.ok());
        assert!(rolled_back.entity().is_none());
        assert!(rolled_back.error_for("name").is_some());
        assert!(rolled_back.error_for("email").is_none());
    }

    #[test]
    fn states_render_for_logs() {
        assert_eq!(OperationState::RolledBack.to_string(), "rolled_back");
    }
}
