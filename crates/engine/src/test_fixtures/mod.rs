//! Shared schemas and wiring for tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures;
//!
//! #[tokio::test]
//! async fn creates_a_user() {
//!     let (app, store) = test_fixtures::in_memory_app();
//!     let manager = app.manager(test_fixtures::user_schema());
//!     // ...
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use lem_domain::{AttributeDescriptor, EntitySchema, Rule};
use once_cell::sync::Lazy;

use crate::app::App;
use crate::infrastructure::clock::FixedClock;
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::settings::EngineSettings;

// =============================================================================
// Schemas
// =============================================================================

static USER_SCHEMA: Lazy<Arc<EntitySchema>> = Lazy::new(|| {
    let schema = EntitySchema::builder("user")
        .attribute(
            AttributeDescriptor::new("username")
                .required()
                .unique()
                .rule(Rule::length(3, 255)),
        )
        .attribute(AttributeDescriptor::new("email").unique().rule(Rule::email()))
        .attribute(
            AttributeDescriptor::new("password")
                .required()
                .rule(Rule::length(8, 255)),
        )
        .attribute(
            AttributeDescriptor::new("role")
                .nullable()
                .rule(Rule::one_of(["admin", "editor", "member"])),
        )
        .attribute(AttributeDescriptor::new("created_at").nullable())
        .attribute(AttributeDescriptor::new("updated_at").nullable())
        .build()
        .expect("user schema is valid");
    Arc::new(schema)
});

static ARTICLE_SCHEMA: Lazy<Arc<EntitySchema>> = Lazy::new(|| {
    let schema = EntitySchema::builder("article")
        .attribute(
            AttributeDescriptor::new("name")
                .required()
                .rule(Rule::length(3, 255)),
        )
        .attribute(AttributeDescriptor::new("description").nullable())
        .attribute(AttributeDescriptor::new("deleted_at").nullable())
        .soft_deletes("deleted_at")
        .build()
        .expect("article schema is valid");
    Arc::new(schema)
});

/// Username (unique, 3..=255), email (unique), password (8..=255), role,
/// and both timestamp columns.
pub fn user_schema() -> Arc<EntitySchema> {
    USER_SCHEMA.clone()
}

/// Name (3..=255), description, soft-deleted through `deleted_at`.
pub fn article_schema() -> Arc<EntitySchema> {
    ARTICLE_SCHEMA.clone()
}

// =============================================================================
// Wiring
// =============================================================================

pub fn fixed_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Default settings on a fresh in-memory store, clock pinned to [`fixed_time`].
pub fn in_memory_app() -> (App, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let app = App::new(
        EngineSettings::default(),
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(fixed_time())),
    );
    (app, store)
}
