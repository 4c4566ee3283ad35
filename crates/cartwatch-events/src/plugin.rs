use cartwatch_core::plugin::{CartwatchPlugin, PluginError, ServiceRegistrationContext};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

use crate::store::{EventStore, SqlEventStore};

/// Event store plugin
///
/// Registers the sea-orm backed store as `Arc<dyn EventStore>` so consumers
/// depend on the interface, not the storage engine.
pub struct EventStorePlugin;

impl Default for EventStorePlugin {
    fn default() -> Self {
        Self
    }
}

impl CartwatchPlugin for EventStorePlugin {
    fn name(&self) -> &'static str {
        "event-store"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a ServiceRegistrationContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
        Box::pin(async move {
            debug!("Registering event store services");

            let db = context.require_service::<sea_orm::DatabaseConnection>();

            let store: Arc<dyn EventStore> = Arc::new(SqlEventStore::new(db));
            context.register_service(store);

            debug!("Event store services registered successfully");
            Ok(())
        })
    }
}
