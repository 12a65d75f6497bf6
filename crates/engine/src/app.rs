//! Application state and composition.

use std::sync::Arc;

use lem_domain::EntitySchema;

use crate::infrastructure::{
    clock::SystemClock,
    logging,
    memory::InMemoryStore,
    ports::{Agent, ClockPort, EntityStore, TransactionPort},
    settings::{EngineSettings, SettingsError},
};
use crate::repositories::{EntityRepository, ScopeRegistry, SoftDeleteScope};
use crate::use_cases::{Manager, TimestampColumns};

/// Composition root.
///
/// Holds the shared store, transaction boundary, scope registry and clock,
/// and hands out repositories and managers per schema.
pub struct App {
    settings: EngineSettings,
    store: Arc<dyn EntityStore>,
    transactions: Arc<dyn TransactionPort>,
    scopes: Arc<ScopeRegistry>,
    clock: Arc<dyn ClockPort>,
}

impl App {
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn EntityStore>,
        transactions: Arc<dyn TransactionPort>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        let scopes = Arc::new(ScopeRegistry::new());
        if settings.soft_deletes {
            scopes.add(Arc::new(SoftDeleteScope));
        }

        Self {
            settings,
            store,
            transactions,
            scopes,
            clock,
        }
    }

    /// In-memory store and system clock.
    pub fn in_memory(settings: EngineSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(
            settings,
            store.clone(),
            store,
            Arc::new(SystemClock::new()),
        )
    }

    /// Load settings from the environment, install tracing, and build an in-memory app.
    pub fn from_env() -> Result<Self, SettingsError> {
        let settings = EngineSettings::load()?;
        logging::init_tracing(&settings.log_filter);
        tracing::info!(
            timestamps = settings.timestamps,
            soft_deletes = settings.soft_deletes,
            "Starting Lem engine"
        );
        Ok(Self::in_memory(settings))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn scopes(&self) -> &Arc<ScopeRegistry> {
        &self.scopes
    }

    pub fn repository(&self, schema: Arc<EntitySchema>) -> Arc<EntityRepository> {
        Arc::new(EntityRepository::new(
            schema,
            self.store.clone(),
            self.scopes.clone(),
        ))
    }

    /// Manager acting without an agent: no permission filtering.
    pub fn manager(&self, schema: Arc<EntitySchema>) -> Manager {
        let mut manager = Manager::new(
            self.repository(schema),
            self.transactions.clone(),
            self.clock.clone(),
        )
        .with_soft_deletes(self.settings.soft_deletes);

        if self.settings.timestamps {
            manager = manager.with_timestamps(TimestampColumns {
                created_at: self.settings.created_at_column.clone(),
                updated_at: self.settings.updated_at_column.clone(),
            });
        }
        manager
    }

    pub fn manager_as(&self, schema: Arc<EntitySchema>, agent: Arc<dyn Agent>) -> Manager {
        self.manager(schema).with_agent(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::FixedClock;
    use crate::test_fixtures::{self, fixed_time};
    use lem_domain::ParameterBag;

    #[test]
    fn soft_delete_scope_follows_settings() {
        let (app, _store) = test_fixtures::in_memory_app();
        assert_eq!(app.scopes().names(), vec![SoftDeleteScope::NAME]);

        let settings = EngineSettings {
            soft_deletes: false,
            ..EngineSettings::default()
        };
        assert!(App::in_memory(settings).scopes().names().is_empty());
    }

    #[tokio::test]
    async fn timestamps_can_be_switched_off() {
        let store = Arc::new(InMemoryStore::new());
        let settings = EngineSettings {
            timestamps: false,
            ..EngineSettings::default()
        };
        let app = App::new(
            settings,
            store.clone(),
            store,
            Arc::new(FixedClock(fixed_time())),
        );

        let entity = app
            .manager(test_fixtures::user_schema())
            .create(
                &ParameterBag::new()
                    .with("username", "alice")
                    .with("password", "long enough"),
            )
            .await
            .unwrap()
            .into_entity()
            .unwrap();

        assert!(entity.get("created_at").is_none());
        assert!(entity.get("updated_at").is_none());
    }

    #[tokio::test]
    async fn managers_share_one_store() {
        let (app, _store) = test_fixtures::in_memory_app();
        let created = app
            .manager(test_fixtures::article_schema())
            .create(&ParameterBag::new().with("name", "shared"))
            .await
            .unwrap()
            .into_entity()
            .unwrap();

        let other = app.repository(test_fixtures::article_schema());
        assert!(other.find_one_by_id(created.id()).await.unwrap().is_some());
    }
}
