//! Entity - a persisted domain record with identity.
//!
//! State lives in an explicit field map. Nothing outside a schema's declared
//! attributes is ever written here by the engine; the typed getters below are
//! the accessors for those attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::ids::EntityId;

/// A domain record of a given kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    kind: String,
    fields: Map<String, Value>,
    /// `false` until the record has been written by a store.
    exists: bool,
}

impl Entity {
    /// A blank, unpersisted entity with a fresh identity.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            kind: kind.into(),
            fields: Map::new(),
            exists: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn mark_persisted(&mut self) {
        self.exists = true;
    }

    /// Look up a field the way a query predicate sees it: `id` resolves to the
    /// identity, absent fields read as `null`.
    pub fn lookup(&self, name: &str) -> Value {
        if name == "id" {
            return Value::String(self.id.to_string());
        }
        self.fields.get(name).cloned().unwrap_or(Value::Null)
    }

    pub fn get_str(&self, name: &str) -> Result<Option<&str>, DomainError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(DomainError::type_mismatch(name, "string")),
        }
    }

    pub fn get_i64(&self, name: &str) -> Result<Option<i64>, DomainError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| DomainError::type_mismatch(name, "integer")),
            Some(_) => Err(DomainError::type_mismatch(name, "integer")),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<Option<bool>, DomainError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(DomainError::type_mismatch(name, "boolean")),
        }
    }

    /// Timestamps are stored as RFC 3339 strings.
    pub fn get_datetime(&self, name: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
        match self.get_str(name)? {
            None => Ok(None),
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|_| DomainError::type_mismatch(name, "RFC 3339 timestamp")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn new_entities_are_blank_and_unpersisted() {
        let entity = Entity::new("user");
        assert_eq!(entity.kind(), "user");
        assert!(!entity.exists());
        assert!(entity.fields().is_empty());
    }

    #[test]
    fn typed_getters_check_the_stored_shape() {
        let mut entity = Entity::new("user");
        entity.set("name", json!("alice"));
        entity.set("age", json!(31));
        entity.set("admin", json!(false));

        assert_eq!(entity.get_str("name").unwrap(), Some("alice"));
        assert_eq!(entity.get_i64("age").unwrap(), Some(31));
        assert_eq!(entity.get_bool("admin").unwrap(), Some(false));
        assert_eq!(entity.get_str("missing").unwrap(), None);
        assert!(entity.get_i64("name").is_err());
    }

    #[test]
    fn datetimes_round_trip_through_rfc3339() {
        let at = Utc.with_ymd_and_hms(2025, 6, 15, 10, 30, 0).unwrap();
        let mut entity = Entity::new("article");
        entity.set("updated_at", json!(at.to_rfc3339()));

        assert_eq!(entity.get_datetime("updated_at").unwrap(), Some(at));
    }

    #[test]
    fn lookup_resolves_id_and_missing_fields() {
        let entity = Entity::new("user");
        assert_eq!(entity.lookup("id"), json!(entity.id().to_string()));
        assert_eq!(entity.lookup("nope"), Value::Null);
    }
}
