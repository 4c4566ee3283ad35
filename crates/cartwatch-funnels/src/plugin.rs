use cartwatch_core::plugin::{
    CartwatchPlugin, PluginContext, PluginError, PluginRoutes, ServiceRegistrationContext,
};
use cartwatch_core::Clock;
use cartwatch_events::EventStore;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

/// Cart-abandonment analytics plugin
pub struct FunnelsPlugin;

impl Default for FunnelsPlugin {
    fn default() -> Self {
        Self
    }
}

impl CartwatchPlugin for FunnelsPlugin {
    fn name(&self) -> &'static str {
        "funnels"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a ServiceRegistrationContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
        Box::pin(async move {
            debug!("Registering funnels services");

            let store = context.require_service::<dyn EventStore>();
            let clock = context.require_service::<dyn Clock>();

            let abandonment_service =
                Arc::new(crate::services::AbandonmentService::new(store, clock));
            context.register_service(abandonment_service);

            debug!("Funnels services registered successfully");
            Ok(())
        })
    }

    fn configure_routes(&self, context: &PluginContext) -> Option<PluginRoutes> {
        let abandonment_service = context.get_service::<crate::services::AbandonmentService>()?;

        let routes = crate::handlers::handler::configure_routes()
            .with_state(Arc::new(crate::handlers::types::AppState {
                abandonment_service,
            }));

        Some(PluginRoutes { router: routes })
    }

    fn openapi_schema(&self) -> Option<utoipa::openapi::OpenApi> {
        Some(<crate::handlers::handler::AbandonmentApiDoc as utoipa::OpenApi>::openapi())
    }
}
