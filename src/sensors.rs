//! Projections from a [Printer] to named, typed state values.
//!
//! Everything here is a pure function of the printer object and a
//! [ProjectionContext]; nothing touches the network or the coordinator.

use chrono::{DateTime, Utc};
use parse_display::{Display, FromStr};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::printer::{integer, number, scalar_string, text, truthy, Printer, PrintRun};

/// Default recency window for [BinarySensorKind::Online].
pub const DEFAULT_ONLINE_WINDOW: std::time::Duration = std::time::Duration::from_secs(10 * 60);

/// Inputs shared by every projection, besides the printer itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionContext {
    /// The current time.
    pub now: DateTime<Utc>,

    /// How recent the last ping must be for a printer to count as online.
    pub online_window: chrono::Duration,
}

impl ProjectionContext {
    /// Build a context for the given instant.
    pub fn new(now: DateTime<Utc>, online_window: std::time::Duration) -> Self {
        Self {
            now,
            online_window: chrono::Duration::from_std(online_window)
                .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100)),
        }
    }

    /// Build a context for right now.
    pub fn now(online_window: std::time::Duration) -> Self {
        Self::new(Utc::now(), online_window)
    }
}

/// Whether a value is of everyday interest or only useful when debugging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Shown by default.
    Primary,
    /// Diagnostic detail.
    Diagnostic,
}

/// A typed state value.
#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum SensorValue {
    /// On / off.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Real number.
    Float(f64),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Free text.
    Text(String),
}

/// The projected state of a single sensor.
#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
pub struct SensorState {
    /// Stable identifier, such as `progress`.
    pub key: String,

    /// Human readable name.
    pub name: String,

    /// Unit of measurement, if any.
    pub unit: Option<String>,

    /// Primary or diagnostic.
    pub category: Category,

    /// False when the value cannot be trusted: the last refresh failed, the
    /// printer is gone, or the value needs a print run that isn't there.
    pub available: bool,

    /// The value; `null` when unknown.
    pub value: Option<SensorValue>,
}

/// Every sensor projected from a printer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, FromStr)]
#[serde(rename_all = "snake_case")]
#[display(style = "snake_case")]
pub enum SensorKind {
    /// Printer status string.
    PrinterStatus,
    /// Firmware version.
    FirmwareVersion,
    /// Last time the printer checked in.
    LastPing,
    /// Name of the current job.
    CurrentJobName,
    /// Status of the current job.
    CurrentJobStatus,
    /// Job progress, in percent.
    Progress,
    /// Estimated time left, in seconds.
    TimeRemaining,
    /// Estimated time left, as `HH:MM:SS`.
    TimeRemainingHms,
    /// Estimated completion time.
    Eta,
    /// Time spent printing, in seconds.
    ElapsedTime,
    /// Time spent printing, as `HH:MM:SS`.
    ElapsedTimeHms,
    /// Layer being printed.
    CurrentLayer,
    /// Layers in the job.
    LayerCount,
    /// Resin used by the job.
    Material,
    /// Resin in the cartridge.
    CartridgeMaterial,
    /// Resin left in the cartridge, in millilitres.
    CartridgeVolumeRemaining,
    /// Resin the tank is used with.
    TankMaterial,
    /// Accumulated tank print time, as `HH:MM:SS`.
    TankPrintTimeHms,
    /// Accumulated tank print time, in milliseconds.
    TankPrintTimeMs,
    /// Layers printed with the tank.
    TankLayersPrinted,
}

impl SensorKind {
    /// Every sensor, in presentation order.
    pub const ALL: [SensorKind; 20] = [
        SensorKind::PrinterStatus,
        SensorKind::FirmwareVersion,
        SensorKind::LastPing,
        SensorKind::CurrentJobName,
        SensorKind::CurrentJobStatus,
        SensorKind::Progress,
        SensorKind::TimeRemaining,
        SensorKind::TimeRemainingHms,
        SensorKind::Eta,
        SensorKind::ElapsedTime,
        SensorKind::ElapsedTimeHms,
        SensorKind::CurrentLayer,
        SensorKind::LayerCount,
        SensorKind::Material,
        SensorKind::CartridgeMaterial,
        SensorKind::CartridgeVolumeRemaining,
        SensorKind::TankMaterial,
        SensorKind::TankPrintTimeHms,
        SensorKind::TankPrintTimeMs,
        SensorKind::TankLayersPrinted,
    ];

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            SensorKind::PrinterStatus => "Printer status",
            SensorKind::FirmwareVersion => "Firmware version",
            SensorKind::LastPing => "Last ping",
            SensorKind::CurrentJobName => "Current job name",
            SensorKind::CurrentJobStatus => "Current job status",
            SensorKind::Progress => "Progress",
            SensorKind::TimeRemaining => "Time remaining",
            SensorKind::TimeRemainingHms => "Time remaining (HMS)",
            SensorKind::Eta => "Estimated completion",
            SensorKind::ElapsedTime => "Elapsed time",
            SensorKind::ElapsedTimeHms => "Elapsed time (HMS)",
            SensorKind::CurrentLayer => "Current layer",
            SensorKind::LayerCount => "Layer count",
            SensorKind::Material => "Material",
            SensorKind::CartridgeMaterial => "Cartridge material",
            SensorKind::CartridgeVolumeRemaining => "Cartridge volume remaining",
            SensorKind::TankMaterial => "Tank material",
            SensorKind::TankPrintTimeHms => "Tank print time (HMS)",
            SensorKind::TankPrintTimeMs => "Tank print time (ms)",
            SensorKind::TankLayersPrinted => "Tank layers printed",
        }
    }

    /// Unit of measurement.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SensorKind::Progress => Some("%"),
            SensorKind::TimeRemaining | SensorKind::ElapsedTime => Some("s"),
            SensorKind::CartridgeVolumeRemaining => Some("mL"),
            SensorKind::TankPrintTimeMs => Some("ms"),
            _ => None,
        }
    }

    /// Primary or diagnostic.
    pub fn category(&self) -> Category {
        match self {
            SensorKind::FirmwareVersion
            | SensorKind::LastPing
            | SensorKind::TankPrintTimeMs
            | SensorKind::TankLayersPrinted => Category::Diagnostic,
            _ => Category::Primary,
        }
    }

    /// True for values read from the current print run. Those are
    /// unavailable while the printer has none.
    pub fn requires_print_run(&self) -> bool {
        matches!(
            self,
            SensorKind::CurrentJobName
                | SensorKind::CurrentJobStatus
                | SensorKind::Progress
                | SensorKind::TimeRemaining
                | SensorKind::TimeRemainingHms
                | SensorKind::Eta
                | SensorKind::ElapsedTime
                | SensorKind::ElapsedTimeHms
                | SensorKind::CurrentLayer
                | SensorKind::LayerCount
                | SensorKind::Material
        )
    }

    /// Compute this sensor's value for a printer.
    pub fn project(&self, printer: &Printer<'_>, ctx: &ProjectionContext) -> Option<SensorValue> {
        let run = printer.current_print_run();

        match self {
            SensorKind::PrinterStatus => printer.status().map(SensorValue::Text),
            SensorKind::FirmwareVersion => printer.firmware_version().map(SensorValue::Text),
            SensorKind::LastPing => printer.last_pinged_at().map(SensorValue::Timestamp),
            SensorKind::CurrentJobName => run?.name().map(SensorValue::Text),
            SensorKind::CurrentJobStatus => run?.status().map(SensorValue::Text),
            SensorKind::Progress => progress_percent(&run?).map(SensorValue::Float),
            SensorKind::TimeRemaining => run?
                .estimated_time_remaining_ms()
                .map(|ms| SensorValue::Integer(ms_to_whole_seconds(ms))),
            SensorKind::TimeRemainingHms => run?
                .estimated_time_remaining_ms()
                .map(|ms| SensorValue::Text(format_hms(ms / 1000.0))),
            SensorKind::Eta => eta(&run?, ctx.now).map(SensorValue::Timestamp),
            SensorKind::ElapsedTime => run?
                .elapsed_duration_ms()
                .map(|ms| SensorValue::Integer(ms_to_whole_seconds(ms))),
            SensorKind::ElapsedTimeHms => run?
                .elapsed_duration_ms()
                .map(|ms| SensorValue::Text(format_hms(ms / 1000.0))),
            SensorKind::CurrentLayer => run?.currently_printing_layer().map(SensorValue::Integer),
            SensorKind::LayerCount => run?.layer_count().map(SensorValue::Integer),
            SensorKind::Material => run?.material().map(SensorValue::Text),
            SensorKind::CartridgeMaterial => printer
                .cartridge()
                .and_then(|cartridge| scalar_string(cartridge.get("material")?))
                .map(SensorValue::Text),
            SensorKind::CartridgeVolumeRemaining => printer
                .cartridge()
                .and_then(remaining_volume_ml)
                .map(SensorValue::Float),
            SensorKind::TankMaterial => printer.tank().and_then(tank_material).map(SensorValue::Text),
            SensorKind::TankPrintTimeHms => tank_integer(printer, "print_time_ms")
                .map(|ms| SensorValue::Text(format_hms(ms as f64 / 1000.0))),
            SensorKind::TankPrintTimeMs => tank_integer(printer, "print_time_ms").map(SensorValue::Integer),
            SensorKind::TankLayersPrinted => tank_integer(printer, "layers_printed").map(SensorValue::Integer),
        }
    }
}

/// Every on/off value projected from a printer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, FromStr)]
#[serde(rename_all = "snake_case")]
#[display(style = "snake_case")]
pub enum BinarySensorKind {
    /// Pinged the cloud recently.
    Online,
    /// Status is `PRINTING`.
    Printing,
    /// Status is `PAUSED`.
    Paused,
    /// Status is `ERROR`.
    Error,
    /// The printer needs someone to look at it.
    WaitingForResolution,
    /// The printer says it can start a job.
    ReadyToPrint,
}

impl BinarySensorKind {
    /// Every binary sensor, in presentation order.
    pub const ALL: [BinarySensorKind; 6] = [
        BinarySensorKind::Online,
        BinarySensorKind::Printing,
        BinarySensorKind::Paused,
        BinarySensorKind::Error,
        BinarySensorKind::WaitingForResolution,
        BinarySensorKind::ReadyToPrint,
    ];

    /// Human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            BinarySensorKind::Online => "Online",
            BinarySensorKind::Printing => "Printing",
            BinarySensorKind::Paused => "Paused",
            BinarySensorKind::Error => "Error",
            BinarySensorKind::WaitingForResolution => "Waiting for resolution",
            BinarySensorKind::ReadyToPrint => "Ready to print",
        }
    }

    /// Compute this sensor's value for a printer.
    pub fn project(&self, printer: &Printer<'_>, ctx: &ProjectionContext) -> bool {
        match self {
            BinarySensorKind::Online => is_online(printer, ctx.now, ctx.online_window),
            BinarySensorKind::Printing => status_is(printer, "PRINTING"),
            BinarySensorKind::Paused => status_is(printer, "PAUSED"),
            BinarySensorKind::Error => status_is(printer, "ERROR"),
            BinarySensorKind::WaitingForResolution => printer
                .printer_status()
                .and_then(|status| status.get("waiting_for_resolution"))
                .is_some_and(truthy),
            BinarySensorKind::ReadyToPrint => printer
                .printer_status()
                .and_then(|status| status.get("ready_to_print"))
                .is_some_and(ready_flag),
        }
    }
}

/// Project every sensor. `available` is the availability of the printer as
/// a whole (coordinator healthy and printer present).
pub fn sensor_states(printer: &Printer<'_>, available: bool, ctx: &ProjectionContext) -> Vec<SensorState> {
    let has_run = printer.current_print_run().is_some();

    SensorKind::ALL
        .iter()
        .map(|kind| SensorState {
            key: kind.to_string(),
            name: kind.name().to_owned(),
            unit: kind.unit().map(str::to_owned),
            category: kind.category(),
            available: available && (has_run || !kind.requires_print_run()),
            value: kind.project(printer, ctx),
        })
        .collect()
}

/// Project every binary sensor.
pub fn binary_sensor_states(printer: &Printer<'_>, available: bool, ctx: &ProjectionContext) -> Vec<SensorState> {
    BinarySensorKind::ALL
        .iter()
        .map(|kind| SensorState {
            key: kind.to_string(),
            name: kind.name().to_owned(),
            unit: None,
            category: Category::Primary,
            available,
            value: Some(SensorValue::Bool(kind.project(printer, ctx))),
        })
        .collect()
}

/// True if the printer pinged the cloud no longer than `window` ago.
/// A missing or unparseable ping counts as offline.
pub fn is_online(printer: &Printer<'_>, now: DateTime<Utc>, window: chrono::Duration) -> bool {
    printer
        .last_pinged_at()
        .is_some_and(|ping| now.signed_duration_since(ping) <= window)
}

/// Job progress in percent, rounded and clamped to `[0, 100]`.
///
/// Uses the layer counters when the run has them. A layer count of zero
/// yields `None`. Only when both layer fields are absent does this fall back
/// to elapsed time over estimated duration.
pub fn progress_percent(run: &PrintRun<'_>) -> Option<f64> {
    let layer = present(run.raw(), "currently_printing_layer");
    let total = present(run.raw(), "layer_count");

    let ratio = if layer.is_some() || total.is_some() {
        let layer = number(layer?)?;
        let total = number(total?)?;
        if total <= 0.0 {
            return None;
        }
        layer / total
    } else {
        let elapsed = run.elapsed_duration_ms()?;
        let total = match run.estimated_duration_ms() {
            Some(total) => total,
            None => elapsed + run.estimated_time_remaining_ms()?,
        };
        if total <= 0.0 {
            return None;
        }
        elapsed / total
    };

    if !ratio.is_finite() {
        return None;
    }
    Some((ratio * 100.0).clamp(0.0, 100.0).round())
}

/// Estimated completion time: `now` plus the remaining duration, never
/// earlier than `now`.
pub fn eta(run: &PrintRun<'_>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let remaining = run.estimated_time_remaining_ms()?;
    if !remaining.is_finite() {
        return None;
    }
    if remaining <= 0.0 {
        return Some(now);
    }
    now.checked_add_signed(chrono::Duration::milliseconds(remaining as i64))
}

/// Resin left in a cartridge, in millilitres, floored at zero.
pub fn remaining_volume_ml(cartridge: &Map<String, Value>) -> Option<f64> {
    let initial = number(cartridge.get("initial_volume_ml")?)?;
    let dispensed = number(cartridge.get("volume_dispensed_ml")?)?;
    Some((initial - dispensed).max(0.0))
}

/// Format a number of seconds as `HH:MM:SS`. Fractions are dropped and
/// negative durations read as zero.
pub fn format_hms(seconds: f64) -> String {
    let total = (seconds.trunc() as i64).max(0);
    format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn ms_to_whole_seconds(ms: f64) -> i64 {
    (ms / 1000.0).trunc() as i64
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn status_is(printer: &Printer<'_>, expected: &str) -> bool {
    printer
        .status()
        .is_some_and(|status| status.eq_ignore_ascii_case(expected))
}

fn ready_flag(value: &Value) -> bool {
    match value {
        Value::Bool(ready) => *ready,
        Value::Null => false,
        other => scalar_string(other).is_some_and(|flag| {
            matches!(
                flag.trim().to_ascii_uppercase().as_str(),
                "READY" | "TRUE" | "YES" | "ON" | "1"
            )
        }),
    }
}

fn tank_material(tank: &Map<String, Value>) -> Option<String> {
    ["material", "material_name", "display_name"]
        .iter()
        .find_map(|key| text(tank.get(*key)))
}

fn tank_integer(printer: &Printer<'_>, key: &str) -> Option<i64> {
    integer(printer.tank()?.get(key)?)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn ctx() -> ProjectionContext {
        ProjectionContext::new(now(), DEFAULT_ONLINE_WINDOW)
    }

    fn run_of(raw: &Value) -> PrintRun<'_> {
        PrintRun::new(raw.as_object().unwrap())
    }

    #[test]
    fn test_progress_from_layers() {
        let raw = json!({"currently_printing_layer": 50, "layer_count": 200});
        assert_eq!(progress_percent(&run_of(&raw)), Some(25.0));
    }

    #[test]
    fn test_progress_zero_layer_count_is_unknown() {
        let raw = json!({"currently_printing_layer": 50, "layer_count": 0, "elapsed_duration_ms": 10});
        assert_eq!(progress_percent(&run_of(&raw)), None);
    }

    #[test]
    fn test_progress_is_clamped_and_rounded() {
        let raw = json!({"currently_printing_layer": 250, "layer_count": 200});
        assert_eq!(progress_percent(&run_of(&raw)), Some(100.0));

        let raw = json!({"currently_printing_layer": -3, "layer_count": 200});
        assert_eq!(progress_percent(&run_of(&raw)), Some(0.0));

        let raw = json!({"currently_printing_layer": "1", "layer_count": "3"});
        assert_eq!(progress_percent(&run_of(&raw)), Some(33.0));
    }

    #[test]
    fn test_progress_falls_back_to_durations() {
        let raw = json!({"elapsed_duration_ms": 30_000, "estimated_duration_ms": 120_000});
        assert_eq!(progress_percent(&run_of(&raw)), Some(25.0));

        let raw = json!({
            "currently_printing_layer": null,
            "elapsed_duration_ms": 60_000,
            "estimated_time_remaining_ms": 60_000,
        });
        assert_eq!(progress_percent(&run_of(&raw)), Some(50.0));

        assert_eq!(progress_percent(&run_of(&json!({}))), None);
    }

    #[test]
    fn test_progress_with_one_layer_field_does_not_fall_back() {
        let raw = json!({"currently_printing_layer": 10, "elapsed_duration_ms": 1, "estimated_duration_ms": 2});
        assert_eq!(progress_percent(&run_of(&raw)), None);
    }

    #[test]
    fn test_eta() {
        let raw = json!({"estimated_time_remaining_ms": 90_000});
        assert_eq!(eta(&run_of(&raw), now()), Some(now() + chrono::Duration::seconds(90)));

        let raw = json!({"estimated_time_remaining_ms": -5_000});
        assert_eq!(eta(&run_of(&raw), now()), Some(now()));

        let raw = json!({"estimated_time_remaining_ms": 0});
        assert_eq!(eta(&run_of(&raw), now()), Some(now()));

        assert_eq!(eta(&run_of(&json!({})), now()), None);
    }

    #[test]
    fn test_remaining_volume_is_floored() {
        let cartridge = json!({"initial_volume_ml": 1000, "volume_dispensed_ml": 1200});
        assert_eq!(remaining_volume_ml(cartridge.as_object().unwrap()), Some(0.0));

        let cartridge = json!({"initial_volume_ml": 1000, "volume_dispensed_ml": 250.5});
        assert_eq!(remaining_volume_ml(cartridge.as_object().unwrap()), Some(749.5));

        let cartridge = json!({"initial_volume_ml": 1000});
        assert_eq!(remaining_volume_ml(cartridge.as_object().unwrap()), None);
    }

    #[test]
    fn test_non_finite_strings_read_as_unknown() {
        for bad in ["NaN", "inf", "-inf"] {
            let raw = json!({
                "printer_status": {
                    "status": "PRINTING",
                    "current_print_run": {"estimated_time_remaining_ms": bad},
                },
                "cartridge_status": [{"cartridge": {"initial_volume_ml": bad, "volume_dispensed_ml": 100}}],
            });
            let printer = Printer::new(&raw);

            assert_eq!(SensorKind::TimeRemaining.project(&printer, &ctx()), None, "{}", bad);
            assert_eq!(SensorKind::TimeRemainingHms.project(&printer, &ctx()), None, "{}", bad);
            assert_eq!(SensorKind::Eta.project(&printer, &ctx()), None, "{}", bad);
            assert_eq!(
                SensorKind::CartridgeVolumeRemaining.project(&printer, &ctx()),
                None,
                "{}",
                bad
            );
        }
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "00:00:00");
        assert_eq!(format_hms(3725.9), "01:02:05");
        assert_eq!(format_hms(-12.0), "00:00:00");
        assert_eq!(format_hms(360_000.0), "100:00:00");
    }

    #[test]
    fn test_online_uses_ping_recency() {
        let window = chrono::Duration::minutes(10);

        let five_ago = json!({"printer_status": {
            "last_pinged_at": (now() - chrono::Duration::minutes(5)).to_rfc3339()
        }});
        assert!(is_online(&Printer::new(&five_ago), now(), window));

        let fifteen_ago = json!({"printer_status": {
            "last_pinged_at": (now() - chrono::Duration::minutes(15)).to_rfc3339()
        }});
        assert!(!is_online(&Printer::new(&fifteen_ago), now(), window));

        let never = json!({"printer_status": {"status": "IDLE"}});
        assert!(!is_online(&Printer::new(&never), now(), window));

        let garbage = json!({"printer_status": {"last_pinged_at": "yesterday-ish"}});
        assert!(!is_online(&Printer::new(&garbage), now(), window));
    }

    #[test]
    fn test_status_binary_sensors() {
        let raw = json!({"printer_status": {"status": "printing"}});
        let printer = Printer::new(&raw);

        assert!(BinarySensorKind::Printing.project(&printer, &ctx()));
        assert!(!BinarySensorKind::Paused.project(&printer, &ctx()));
        assert!(!BinarySensorKind::Error.project(&printer, &ctx()));
    }

    #[test]
    fn test_ready_to_print_accepts_loose_flags() {
        for (flag, expected) in [
            (json!(true), true),
            (json!(false), false),
            (json!(null), false),
            (json!("READY"), true),
            (json!("yes"), true),
            (json!(1), true),
            (json!("NOT_READY"), false),
            (json!(0), false),
        ] {
            let raw = json!({"printer_status": {"ready_to_print": flag.clone()}});
            assert_eq!(
                BinarySensorKind::ReadyToPrint.project(&Printer::new(&raw), &ctx()),
                expected,
                "flag {:?}",
                flag
            );
        }
    }

    #[test]
    fn test_sensor_kind_keys_round_trip() {
        assert_eq!(SensorKind::CartridgeVolumeRemaining.to_string(), "cartridge_volume_remaining");
        assert_eq!("time_remaining_hms".parse::<SensorKind>().unwrap(), SensorKind::TimeRemainingHms);
        assert_eq!(BinarySensorKind::WaitingForResolution.to_string(), "waiting_for_resolution");
    }

    #[test]
    fn test_print_run_sensors_unavailable_without_run() {
        let raw = json!({
            "serial": "Form3-Idle",
            "printer_status": {"status": "IDLE", "current_print_run": null},
            "cartridge_status": [{"cartridge": {"material": "FLGPGR04", "initial_volume_ml": 1000, "volume_dispensed_ml": 100}}],
        });
        let states = sensor_states(&Printer::new(&raw), true, &ctx());

        let progress = states.iter().find(|s| s.key == "progress").unwrap();
        assert!(!progress.available);
        assert_eq!(progress.value, None);

        let status = states.iter().find(|s| s.key == "printer_status").unwrap();
        assert!(status.available);
        assert_eq!(status.value, Some(SensorValue::Text("IDLE".to_owned())));

        let remaining = states.iter().find(|s| s.key == "cartridge_volume_remaining").unwrap();
        assert_eq!(remaining.value, Some(SensorValue::Float(900.0)));
        assert_eq!(remaining.unit.as_deref(), Some("mL"));
    }

    #[test]
    fn test_full_printer_projection() {
        let raw = json!({
            "serial": "Form4-Busy",
            "firmware_version": "1.9.2",
            "printer_status": {
                "status": "PRINTING",
                "last_pinged_at": "2024-05-01T11:59:00Z",
                "current_print_run": {
                    "name": "brackets",
                    "status": "PRINTING",
                    "currently_printing_layer": 120,
                    "layer_count": 480,
                    "elapsed_duration_ms": 3_600_000,
                    "estimated_time_remaining_ms": 5_400_500,
                    "material_name": "Grey V5",
                },
            },
            "tank_status": {"tank": {"display_name": "Grey tank", "print_time_ms": 7_200_000, "layers_printed": "9000"}},
        });
        let printer = Printer::new(&raw);
        let value = |kind: SensorKind| kind.project(&printer, &ctx());

        assert_eq!(value(SensorKind::Progress), Some(SensorValue::Float(25.0)));
        assert_eq!(value(SensorKind::TimeRemaining), Some(SensorValue::Integer(5400)));
        assert_eq!(value(SensorKind::TimeRemainingHms), Some(SensorValue::Text("01:30:00".to_owned())));
        assert_eq!(value(SensorKind::ElapsedTimeHms), Some(SensorValue::Text("01:00:00".to_owned())));
        assert_eq!(
            value(SensorKind::Eta),
            Some(SensorValue::Timestamp(now() + chrono::Duration::milliseconds(5_400_500)))
        );
        assert_eq!(value(SensorKind::Material), Some(SensorValue::Text("Grey V5".to_owned())));
        assert_eq!(value(SensorKind::TankMaterial), Some(SensorValue::Text("Grey tank".to_owned())));
        assert_eq!(value(SensorKind::TankPrintTimeHms), Some(SensorValue::Text("02:00:00".to_owned())));
        assert_eq!(value(SensorKind::TankLayersPrinted), Some(SensorValue::Integer(9000)));
        assert_eq!(value(SensorKind::CartridgeMaterial), None);
        assert!(BinarySensorKind::Online.project(&printer, &ctx()));
    }
}
