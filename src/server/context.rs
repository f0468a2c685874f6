use std::{collections::BTreeMap, sync::Arc, time::Duration};

use dropshot::HttpError;
use prometheus_client::registry::Registry;

use crate::{coordinator::Coordinator, sensors::ProjectionContext, thumbnail::ThumbnailFetcher};

/**
 * Application-specific context (state shared by handler functions)
 */
pub struct Context {
    /// OpenAPI document served at `/`.
    pub schema: serde_json::Value,

    /// Root logger for request handling.
    pub logger: slog::Logger,

    /// One coordinator per configured installation.
    pub installations: BTreeMap<String, Arc<Coordinator>>,

    /// How recently a printer must have pinged to count as online.
    pub online_window: Duration,

    /// Downloads print thumbnails.
    pub thumbnails: ThumbnailFetcher,

    /// Metrics exposed at `/metrics`.
    pub registry: Registry,
}

impl Context {
    /**
     * Return a new Context.
     */
    pub fn new(
        schema: serde_json::Value,
        logger: slog::Logger,
        installations: BTreeMap<String, Arc<Coordinator>>,
        online_window: Duration,
        registry: Registry,
    ) -> Context {
        Context {
            schema,
            logger,
            installations,
            online_window,
            thumbnails: ThumbnailFetcher::default(),
            registry,
        }
    }

    /// Look up an installation, or 404.
    pub fn installation(&self, name: &str) -> Result<&Arc<Coordinator>, HttpError> {
        self.installations
            .get(name)
            .ok_or_else(|| HttpError::for_not_found(None, format!("installation not found: {:?}", name)))
    }

    /// Projection inputs for this instant.
    pub fn projection(&self) -> ProjectionContext {
        ProjectionContext::now(self.online_window)
    }
}
