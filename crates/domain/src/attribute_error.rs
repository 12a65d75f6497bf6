//! Field-level errors collected by validation and authorization.
//!
//! These are data, not control flow: the pipeline accumulates them and hands
//! the whole list back to the caller in one round trip.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why an attribute was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Required on create but absent from the submitted parameters
    NotDefined,
    /// Submitted value failed the attribute's rule
    NotValid,
    /// Another record already holds the value
    NotUnique,
    /// The agent may not fill the attribute
    NotAuthorized,
}

impl ErrorKind {
    pub fn code_suffix(&self) -> &'static str {
        match self {
            Self::NotDefined => "NOT_DEFINED",
            Self::NotValid => "NOT_VALID",
            Self::NotUnique => "NOT_UNIQUE",
            Self::NotAuthorized => "NOT_AUTHORIZED",
        }
    }

    /// Message template; `%s` is replaced by the attribute name.
    pub fn message_template(&self) -> &'static str {
        match self {
            Self::NotDefined => "The %s is required",
            Self::NotValid => "The %s is not valid",
            Self::NotUnique => "The %s is not unique",
            Self::NotAuthorized => "The %s is not authorized",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code_suffix())
    }
}

/// One rejected attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeError {
    kind: ErrorKind,
    attribute: String,
    /// e.g. `USER_USERNAME_NOT_UNIQUE`
    code: String,
    template: String,
    value: Option<Value>,
}

impl AttributeError {
    pub fn new(
        kind: ErrorKind,
        entity_kind: &str,
        attribute: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        let attribute = attribute.into();
        let code = format!(
            "{}_{}_{}",
            code_segment(entity_kind),
            code_segment(&attribute),
            kind.code_suffix()
        );
        Self {
            kind,
            attribute,
            code,
            template: kind.message_template().to_string(),
            value,
        }
    }

    pub fn not_defined(entity_kind: &str, attribute: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotDefined, entity_kind, attribute, None)
    }

    pub fn not_valid(entity_kind: &str, attribute: impl Into<String>, value: Value) -> Self {
        Self::new(ErrorKind::NotValid, entity_kind, attribute, Some(value))
    }

    pub fn not_unique(entity_kind: &str, attribute: impl Into<String>, value: Value) -> Self {
        Self::new(ErrorKind::NotUnique, entity_kind, attribute, Some(value))
    }

    pub fn not_authorized(entity_kind: &str, attribute: impl Into<String>, value: Value) -> Self {
        Self::new(ErrorKind::NotAuthorized, entity_kind, attribute, Some(value))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Rendered human message.
    pub fn message(&self) -> String {
        self.template.replacen("%s", &self.attribute, 1)
    }
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message())
    }
}

impl std::error::Error for AttributeError {}

/// Upper snake case with anything non-alphanumeric folded to `_`.
fn code_segment(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
