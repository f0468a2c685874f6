//! Defensive, read-only views over a single printer object.
//!
//! The api payload differs between printer generations, and most fields may
//! be missing or `null` at any time. Every accessor here returns `None`
//! rather than failing when the payload does not look the way it expects.

use chrono::{DateTime, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const MANUFACTURER: &str = "Formlabs";
const FALLBACK_NAME: &str = "Formlabs printer";

/// A single printer, as found in a [crate::Snapshot].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Printer<'a> {
    raw: &'a Value,
}

impl<'a> Printer<'a> {
    /// Wrap a raw printer object.
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    /// The unmodified object from the api.
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    /// Serial number, if the object has a string one.
    pub fn serial(&self) -> Option<&'a str> {
        self.raw.get("serial").and_then(Value::as_str)
    }

    /// Human facing name: the alias, falling back through the other naming
    /// fields to the serial.
    pub fn display_name(&self) -> String {
        ["alias", "name", "printer_name", "serial"]
            .iter()
            .find_map(|key| text(self.raw.get(*key)))
            .unwrap_or_else(|| FALLBACK_NAME.to_owned())
    }

    /// Model identifier.
    pub fn model(&self) -> Option<String> {
        ["machine_type_id", "machine_type", "printer_type"]
            .iter()
            .find_map(|key| text(self.raw.get(*key)))
    }

    /// Firmware version string.
    pub fn firmware_version(&self) -> Option<String> {
        text(self.raw.get("firmware_version")).or_else(|| text(self.raw.get("firmware")))
    }

    /// The `printer_status` object.
    pub fn printer_status(&self) -> Option<&'a Map<String, Value>> {
        self.raw.get("printer_status").and_then(Value::as_object)
    }

    /// Status string reported by the printer, such as `IDLE` or `PRINTING`.
    pub fn status(&self) -> Option<String> {
        scalar_string(self.printer_status()?.get("status")?)
    }

    /// When the printer last checked in with the cloud.
    pub fn last_pinged_at(&self) -> Option<DateTime<Utc>> {
        let from_status = self.printer_status().and_then(|status| status.get("last_pinged_at"));
        parse_timestamp(from_status.filter(|v| truthy(v)).or_else(|| self.raw.get("last_pinged_at"))?)
    }

    /// The current (or most recent) print run, if the status carries one.
    pub fn current_print_run(&self) -> Option<PrintRun<'a>> {
        self.printer_status()?
            .get("current_print_run")
            .and_then(Value::as_object)
            .map(PrintRun::new)
    }

    /// The `tank_status.tank` object.
    pub fn tank(&self) -> Option<&'a Map<String, Value>> {
        self.raw
            .get("tank_status")
            .and_then(Value::as_object)?
            .get("tank")
            .and_then(Value::as_object)
    }

    /// How this printer encodes its cartridge status.
    pub fn cartridge_encoding(&self) -> CartridgeEncoding<'a> {
        CartridgeEncoding::parse(self.raw.get("cartridge_status"))
    }

    /// The resolved cartridge object, whatever the encoding.
    pub fn cartridge(&self) -> Option<&'a Map<String, Value>> {
        self.cartridge_encoding().cartridge()
    }

    /// Metadata describing the physical device.
    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            serial: self.serial().map(str::to_owned),
            name: self.display_name(),
            manufacturer: MANUFACTURER.to_owned(),
            model: self.model(),
            sw_version: self.firmware_version(),
        }
    }
}

/// Metadata describing a physical printer.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct DeviceInfo {
    /// Serial number.
    pub serial: Option<String>,

    /// Display name.
    pub name: String,

    /// Manufacturer, always `Formlabs`.
    pub manufacturer: String,

    /// Model identifier, such as `FORM-4-0`.
    pub model: Option<String>,

    /// Firmware version.
    pub sw_version: Option<String>,
}

/// A print run record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrintRun<'a> {
    raw: &'a Map<String, Value>,
}

impl<'a> PrintRun<'a> {
    /// Wrap a raw print run object.
    pub fn new(raw: &'a Map<String, Value>) -> Self {
        Self { raw }
    }

    /// The unmodified object.
    pub fn raw(&self) -> &'a Map<String, Value> {
        self.raw
    }

    /// Job name.
    pub fn name(&self) -> Option<String> {
        scalar_string(self.raw.get("name")?)
    }

    /// Job status.
    pub fn status(&self) -> Option<String> {
        scalar_string(self.raw.get("status")?)
    }

    /// Layer currently being printed.
    pub fn currently_printing_layer(&self) -> Option<i64> {
        integer(self.raw.get("currently_printing_layer")?)
    }

    /// Total number of layers in the job.
    pub fn layer_count(&self) -> Option<i64> {
        integer(self.raw.get("layer_count")?)
    }

    /// Time spent printing so far, in milliseconds.
    pub fn elapsed_duration_ms(&self) -> Option<f64> {
        number(self.raw.get("elapsed_duration_ms")?)
    }

    /// Estimated total duration, in milliseconds.
    pub fn estimated_duration_ms(&self) -> Option<f64> {
        number(self.raw.get("estimated_duration_ms")?)
    }

    /// Estimated time left, in milliseconds.
    pub fn estimated_time_remaining_ms(&self) -> Option<f64> {
        number(self.raw.get("estimated_time_remaining_ms")?)
    }

    /// Name of the resin in use.
    pub fn material(&self) -> Option<String> {
        text(self.raw.get("material_name")).or_else(|| text(self.raw.get("material")))
    }

    /// Pre-signed url of the job thumbnail. These expire on their own
    /// schedule, independent of the api token.
    pub fn thumbnail_url(&self) -> Option<String> {
        text(
            self.raw
                .get("print_thumbnail")
                .and_then(Value::as_object)?
                .get("thumbnail"),
        )
    }
}

/// Printer generations disagree on the shape of `cartridge_status`: newer
/// machines report a single object, older ones a list of per-slot objects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CartridgeEncoding<'a> {
    /// One status object.
    Single(&'a Map<String, Value>),

    /// A list of status objects, one per cartridge slot.
    ListOfStatuses(&'a [Value]),

    /// Missing, `null`, or some other shape.
    Absent,
}

impl<'a> CartridgeEncoding<'a> {
    /// Classify a raw `cartridge_status` value.
    pub fn parse(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Object(status)) => Self::Single(status),
            Some(Value::Array(statuses)) => Self::ListOfStatuses(statuses),
            _ => Self::Absent,
        }
    }

    /// The status item describing the cartridge in use. For lists, that is
    /// the first entry with a nested `cartridge` object.
    pub fn status_item(&self) -> Option<&'a Map<String, Value>> {
        match *self {
            Self::Single(status) => Some(status),
            Self::ListOfStatuses(statuses) => statuses
                .iter()
                .filter_map(Value::as_object)
                .find(|status| status.get("cartridge").is_some_and(Value::is_object)),
            Self::Absent => None,
        }
    }

    /// The nested `cartridge` object of [CartridgeEncoding::status_item].
    pub fn cartridge(&self) -> Option<&'a Map<String, Value>> {
        self.status_item()?.get("cartridge").and_then(Value::as_object)
    }
}

/// Loose truthiness, for fields that are sometimes booleans and sometimes
/// something else.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A non-empty string, or a number rendered as one.
pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Any scalar rendered as a string. Unlike [text], empty strings are kept.
pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A finite number, or a string holding one. `NaN` and infinities read as
/// unknown.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// An integer. Fractional numbers are truncated; strings must hold an
/// integer.
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse an RFC 3339 timestamp. Timestamps without an offset are taken to be
/// UTC.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
