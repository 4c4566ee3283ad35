use anyhow::Context;
use axum::Router;
use cartwatch_core::plugin::PluginManager;
use cartwatch_core::{Clock, SystemClock};
use cartwatch_events::EventStorePlugin;
use cartwatch_funnels::FunnelsPlugin;
use clap::Args;
use sea_orm::Database;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};
use utoipa_swagger_ui::SwaggerUi;

/// Start the HTTP API server
#[derive(Args)]
pub struct ServeCommand {
    /// PostgreSQL connection string for the event store
    #[arg(long, env = "CARTWATCH_DATABASE_URL")]
    database_url: String,

    /// Address to bind the API server to
    #[arg(long, default_value = "127.0.0.1:8080", env = "CARTWATCH_LISTEN")]
    listen: String,
}

impl ServeCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        debug!("Connecting to the event store database");
        let db = Database::connect(&self.database_url)
            .await
            .context("Failed to connect to the event store database")?;

        let mut plugin_manager = PluginManager::new();

        // Core services every plugin can rely on
        let service_context = plugin_manager.service_context();
        service_context.register_service(Arc::new(db));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        service_context.register_service(clock);

        // Plugins in dependency order: the event store first, then the
        // analytics that consume it
        debug!("Registering EventStorePlugin");
        plugin_manager.register_plugin(Box::new(EventStorePlugin));
        debug!("Registering FunnelsPlugin");
        plugin_manager.register_plugin(Box::new(FunnelsPlugin));

        plugin_manager
            .initialize_plugins()
            .await
            .context("Plugin initialization failed")?;
        debug!("All plugins initialized successfully");

        let app = plugin_manager
            .build_application()
            .context("Failed to build application")?
            .merge(create_swagger_router(&plugin_manager)?);

        let listener = TcpListener::bind(&self.listen).await?;
        info!("Cartwatch API server listening on {}", self.listen);

        axum::serve(listener, app).await?;
        info!("Cartwatch API server exited");
        Ok(())
    }
}

fn create_swagger_router(plugin_manager: &PluginManager) -> anyhow::Result<Router> {
    let api_doc = plugin_manager
        .get_unified_openapi()
        .map_err(|e| anyhow::anyhow!("Failed to build unified OpenAPI schema: {}", e))?;
    Ok(Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc)))
}
