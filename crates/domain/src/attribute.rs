//! Attribute descriptors - static per-field declarations.
//!
//! Each entity kind declares its fields once: whether they are required on
//! create, unique across records, nullable, which rule a submitted value must
//! satisfy, and which permission tokens gate filling and showing them.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use validator::{ValidateEmail, ValidateLength};

use crate::entity::Entity;

/// Pure validity predicate over `(entity, value)`.
pub type Predicate = Arc<dyn Fn(&Entity, &Value) -> bool + Send + Sync>;

/// A named validity predicate.
#[derive(Clone)]
pub struct Rule {
    name: &'static str,
    predicate: Predicate,
}

impl Rule {
    /// Accepts every value.
    pub fn any() -> Self {
        Self::custom("any", |_, _| true)
    }

    /// String whose character count lies in `min..=max`.
    pub fn length(min: u64, max: u64) -> Self {
        Self::custom("length", move |_, value| match value {
            Value::String(s) => s.validate_length(Some(min), Some(max), None),
            _ => false,
        })
    }

    /// String shaped like an email address.
    pub fn email() -> Self {
        Self::custom("email", |_, value| match value {
            Value::String(s) => s.validate_email(),
            _ => false,
        })
    }

    /// Value equal to one of the accepted values.
    pub fn one_of<I, V>(accepted: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let accepted: Vec<Value> = accepted.into_iter().map(Into::into).collect();
        Self::custom("one_of", move |_, value| accepted.contains(value))
    }

    pub fn custom<F>(name: &'static str, predicate: F) -> Self
    where
        F: Fn(&Entity, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name,
            predicate: Arc::new(predicate),
        }
    }

    pub fn check(&self, entity: &Entity, value: &Value) -> bool {
        (self.predicate)(entity, value)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Which permission token of an attribute is being asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Fill,
    Show,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Show => "show",
        }
    }
}

/// Declaration of one entity field.
#[derive(Debug, Clone)]
pub struct AttributeDescriptor {
    name: String,
    required: bool,
    unique: bool,
    nullable: bool,
    rule: Rule,
    fill_permission: Option<String>,
    show_permission: Option<String>,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            unique: false,
            nullable: false,
            rule: Rule::any(),
            fill_permission: None,
            show_permission: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = rule;
        self
    }

    pub fn fill_permission(mut self, token: impl Into<String>) -> Self {
        self.fill_permission = Some(token.into());
        self
    }

    pub fn show_permission(mut self, token: impl Into<String>) -> Self {
        self.show_permission = Some(token.into());
        self
    }

    /// Fill in `"{kind}.attributes.{name}.{fill|show}"` for unset tokens.
    pub(crate) fn resolve_permissions(&mut self, kind: &str) {
        for permission in [Permission::Fill, Permission::Show] {
            let slot = match permission {
                Permission::Fill => &mut self.fill_permission,
                Permission::Show => &mut self.show_permission,
            };
            if slot.is_none() {
                *slot = Some(format!(
                    "{}.attributes.{}.{}",
                    kind,
                    self.name,
                    permission.as_str()
                ));
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn permission(&self, permission: Permission) -> &str {
        let token = match permission {
            Permission::Fill => &self.fill_permission,
            Permission::Show => &self.show_permission,
        };
        token.as_deref().unwrap_or_default()
    }

    /// `null` passes only for nullable attributes; anything else runs the rule.
    pub fn is_valid(&self, entity: &Entity, value: &Value) -> bool {
        if value.is_null() {
            return self.nullable;
        }
        self.rule.check(entity, value)
    }
}
