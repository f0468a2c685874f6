//! HTTP server publishing the state of every configured installation.

/// Shared server state handed to every endpoint.
pub mod context;
/// HTTP endpoint handlers.
pub mod endpoints;
mod raw;

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use dropshot::{ApiDescription, ConfigDropshot, HttpServer, ServerBuilder};
use prometheus_client::registry::Registry;

pub use context::Context;

use crate::coordinator::Coordinator;

/// Create an API description for the server.
pub fn create_api_description() -> Result<ApiDescription<Arc<Context>>> {
    fn register_endpoints(api: &mut ApiDescription<Arc<Context>>) -> Result<()> {
        api.register(endpoints::api_get_schema)?;
        api.register(endpoints::ping)?;
        api.register(endpoints::get_metrics)?;
        api.register(endpoints::list_installations)?;
        api.register(endpoints::refresh_installation)?;
        api.register(endpoints::list_printers)?;
        api.register(endpoints::get_printer)?;
        api.register(endpoints::get_printer_raw)?;
        api.register(endpoints::get_printer_thumbnail)?;

        Ok(())
    }

    // Describe the API.
    let mut api = ApiDescription::new();
    register_endpoints(&mut api).map_err(|err| anyhow!("failed to register entrypoints: {}", err))?;

    Ok(api)
}

/// Get the OpenAPI specification for the server.
pub fn get_openapi(api: &ApiDescription<Arc<Context>>) -> Result<serde_json::Value> {
    let version = semver::Version::parse(clap::crate_version!())?;
    let mut definition = api.openapi("fleet-api", version);
    definition
        .description("State of Formlabs printers, polled from the Formlabs developer api.")
        .json()
        .map_err(|e| e.into())
}

/// Build the server and start listening on `bind`. Each coordinator's
/// metrics are registered under its installation name.
pub async fn create_server(
    bind: &str,
    installations: BTreeMap<String, Arc<Coordinator>>,
    online_window: Duration,
    logger: slog::Logger,
) -> Result<(HttpServer<Arc<Context>>, Arc<Context>)> {
    let api = create_api_description()?;
    let schema = get_openapi(&api)?;

    let mut registry = Registry::with_prefix("fleet_api");
    for (name, coordinator) in installations.iter() {
        coordinator.metrics().register(&mut registry, name);
    }

    let config_dropshot = ConfigDropshot {
        bind_address: bind.parse()?,
        ..Default::default()
    };

    let dropshot_logger = logger.new(slog::o!("component" => "dropshot"));
    let api_context = Arc::new(Context::new(schema, logger, installations, online_window, registry));

    let server = ServerBuilder::new(api, api_context.clone(), dropshot_logger)
        .config(config_dropshot)
        .start()
        .map_err(|error| anyhow!("failed to create server: {}", error))?;

    Ok((server, api_context))
}

/// Serve until the server shuts down.
pub async fn serve(
    bind: &str,
    installations: BTreeMap<String, Arc<Coordinator>>,
    online_window: Duration,
    logger: slog::Logger,
) -> Result<()> {
    let (server, api_context) = create_server(bind, installations, online_window, logger).await?;

    slog::info!(
        api_context.logger,
        "serving {} installation(s) on {}",
        api_context.installations.len(),
        server.local_addr()
    );

    server.await.map_err(|error| anyhow!("server failed: {}", error))?;

    Ok(())
}
