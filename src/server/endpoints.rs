use std::{collections::BTreeMap, sync::Arc};

use dropshot::{endpoint, HttpError, HttpResponseOk, Path, RequestContext};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    raw::{ImageResponseOk, MetricsResponseOk},
    Context,
};
use crate::{
    coordinator::CoordinatorStatus,
    printer::{DeviceInfo, Printer},
    redact::redact,
    sensors::{binary_sensor_states, is_online, sensor_states, SensorState},
};

/// Return the OpenAPI schema in JSON format.
#[endpoint {
    method = GET,
    path = "/",
    tags = ["meta"],
}]
pub async fn api_get_schema(
    rqctx: RequestContext<Arc<Context>>,
) -> Result<HttpResponseOk<serde_json::Value>, HttpError> {
    Ok(HttpResponseOk(rqctx.context().schema.clone()))
}

/// The response from the `/ping` endpoint.
#[derive(Deserialize, Debug, JsonSchema, Serialize)]
pub struct Pong {
    /// The pong response.
    pub message: String,
}

/** Return pong. */
#[endpoint {
    method = GET,
    path = "/ping",
    tags = ["meta"],
}]
pub async fn ping(_rqctx: RequestContext<Arc<Context>>) -> Result<HttpResponseOk<Pong>, HttpError> {
    Ok(HttpResponseOk(Pong {
        message: "pong".to_string(),
    }))
}

/** List prometheus metrics. */
#[endpoint {
    method = GET,
    path = "/metrics",
    tags = ["meta"],
}]
pub async fn get_metrics(rqctx: RequestContext<Arc<Context>>) -> Result<MetricsResponseOk, HttpError> {
    let mut response = String::new();
    prometheus_client::encoding::text::encode(&mut response, &rqctx.context().registry)
        .map_err(|e| HttpError::for_internal_error(format!("{:?}", e)))?;
    Ok(MetricsResponseOk(response))
}

/// List configured installations and how fresh their data is.
#[endpoint {
    method = GET,
    path = "/installations",
    tags = ["installations"],
}]
pub async fn list_installations(
    rqctx: RequestContext<Arc<Context>>,
) -> Result<HttpResponseOk<BTreeMap<String, CoordinatorStatus>>, HttpError> {
    let ctx = rqctx.context();
    let mut statuses = BTreeMap::new();
    for (name, coordinator) in ctx.installations.iter() {
        statuses.insert(name.clone(), coordinator.status().await);
    }
    Ok(HttpResponseOk(statuses))
}

/// The path parameters for operations on an installation.
#[derive(Deserialize, Debug, JsonSchema, Serialize)]
pub struct InstallationPathParams {
    /// The installation name, as configured.
    pub installation: String,
}

/// Poll an installation right now, instead of waiting for the next tick.
#[endpoint {
    method = POST,
    path = "/installations/{installation}/refresh",
    tags = ["installations"],
}]
pub async fn refresh_installation(
    rqctx: RequestContext<Arc<Context>>,
    path_params: Path<InstallationPathParams>,
) -> Result<HttpResponseOk<CoordinatorStatus>, HttpError> {
    let params = path_params.into_inner();
    let coordinator = rqctx.context().installation(&params.installation)?;

    tracing::info!(installation = params.installation, "manual refresh");
    coordinator
        .refresh()
        .await
        .map_err(|e| HttpError::for_unavail(None, e.to_string()))?;

    Ok(HttpResponseOk(coordinator.status().await))
}

/// A printer, summarized.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PrinterSummary {
    /// Serial number.
    pub serial: String,

    /// Identity of the device.
    pub device: DeviceInfo,

    /// Status string, such as `IDLE` or `PRINTING`.
    pub status: Option<String>,

    /// Pinged the cloud recently.
    pub online: bool,

    /// False if the data shown is stale.
    pub available: bool,
}

/// List the printers of an installation.
#[endpoint {
    method = GET,
    path = "/installations/{installation}/printers",
    tags = ["printers"],
}]
pub async fn list_printers(
    rqctx: RequestContext<Arc<Context>>,
    path_params: Path<InstallationPathParams>,
) -> Result<HttpResponseOk<Vec<PrinterSummary>>, HttpError> {
    let params = path_params.into_inner();
    let ctx = rqctx.context();
    let coordinator = ctx.installation(&params.installation)?;

    let projection = ctx.projection();
    let (snapshot, available) = coordinator.snapshot_with_health().await;

    Ok(HttpResponseOk(
        snapshot
            .printers()
            .map(|(serial, printer)| PrinterSummary {
                serial: serial.to_owned(),
                device: printer.device_info(),
                status: printer.status(),
                online: is_online(&printer, projection.now, projection.online_window),
                available,
            })
            .collect(),
    ))
}

/// The path parameters for operations on a single printer.
#[derive(Deserialize, Debug, JsonSchema, Serialize)]
pub struct PrinterPathParams {
    /// The installation name, as configured.
    pub installation: String,

    /// The printer serial number.
    pub serial: String,
}

/// Everything known about a printer.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PrinterState {
    /// Installation the printer belongs to.
    pub installation: String,

    /// Serial number.
    pub serial: String,

    /// Identity of the device.
    pub device: DeviceInfo,

    /// False if the data shown is stale.
    pub available: bool,

    /// True if a print thumbnail can be fetched.
    pub thumbnail_available: bool,

    /// Every sensor, in a stable order.
    pub sensors: Vec<SensorState>,

    /// Every binary sensor, in a stable order.
    pub binary_sensors: Vec<SensorState>,
}

/// Get the projected state of a single printer.
#[endpoint {
    method = GET,
    path = "/installations/{installation}/printers/{serial}",
    tags = ["printers"],
}]
pub async fn get_printer(
    rqctx: RequestContext<Arc<Context>>,
    path_params: Path<PrinterPathParams>,
) -> Result<HttpResponseOk<PrinterState>, HttpError> {
    let params = path_params.into_inner();
    let ctx = rqctx.context();
    let coordinator = ctx.installation(&params.installation)?;

    let (snapshot, available) = coordinator.snapshot_with_health().await;
    let printer = find_printer(snapshot.printer(&params.serial), &params.serial)?;
    let projection = ctx.projection();

    Ok(HttpResponseOk(PrinterState {
        device: printer.device_info(),
        available,
        thumbnail_available: available && thumbnail_url(&printer).is_some(),
        sensors: sensor_states(&printer, available, &projection),
        binary_sensors: binary_sensor_states(&printer, available, &projection),
        installation: params.installation,
        serial: params.serial,
    }))
}

/// Get the printer object as the vendor returned it, with credentials
/// scrubbed.
#[endpoint {
    method = GET,
    path = "/installations/{installation}/printers/{serial}/raw",
    tags = ["printers"],
}]
pub async fn get_printer_raw(
    rqctx: RequestContext<Arc<Context>>,
    path_params: Path<PrinterPathParams>,
) -> Result<HttpResponseOk<serde_json::Value>, HttpError> {
    let params = path_params.into_inner();
    let coordinator = rqctx.context().installation(&params.installation)?;

    let snapshot = coordinator.snapshot().await;
    let printer = find_printer(snapshot.printer(&params.serial), &params.serial)?;

    Ok(HttpResponseOk(redact(printer.raw())))
}

/// Get the preview image of the current print.
#[endpoint {
    method = GET,
    path = "/installations/{installation}/printers/{serial}/thumbnail",
    tags = ["printers"],
}]
pub async fn get_printer_thumbnail(
    rqctx: RequestContext<Arc<Context>>,
    path_params: Path<PrinterPathParams>,
) -> Result<ImageResponseOk, HttpError> {
    let params = path_params.into_inner();
    let ctx = rqctx.context();
    let coordinator = ctx.installation(&params.installation)?;

    let url = {
        let snapshot = coordinator.snapshot().await;
        let printer = find_printer(snapshot.printer(&params.serial), &params.serial)?;
        thumbnail_url(&printer)
    };
    let Some(url) = url else {
        return Err(HttpError::for_not_found(
            None,
            format!("no thumbnail for printer {:?}", params.serial),
        ));
    };

    match ctx.thumbnails.fetch(&url).await {
        Some(thumbnail) => Ok(ImageResponseOk {
            bytes: thumbnail.bytes,
            content_type: thumbnail.content_type,
        }),
        None => Err(HttpError::for_not_found(
            None,
            format!("thumbnail unavailable for printer {:?}", params.serial),
        )),
    }
}

fn find_printer<'a>(printer: Option<Printer<'a>>, serial: &str) -> Result<Printer<'a>, HttpError> {
    printer.ok_or_else(|| HttpError::for_not_found(None, format!("printer not found by serial: {:?}", serial)))
}

fn thumbnail_url(printer: &Printer<'_>) -> Option<String> {
    printer.current_print_run()?.thumbnail_url()
}
