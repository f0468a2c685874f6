//! The serial-keyed view of an account's printers.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::printer::Printer;

/// Every printer from one successful poll, keyed by serial number.
///
/// Printer objects are kept exactly as the api returned them; anything
/// below the top level is interpreted lazily through [Printer].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    printers: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Key a printer listing by serial.
    ///
    /// Entries that are not objects, or that do not carry a usable serial,
    /// are dropped. If two entries share a serial the later one wins.
    pub fn from_printers<PrintersT>(printers: PrintersT) -> Self
    where
        PrintersT: IntoIterator<Item = Value>,
    {
        let mut by_serial = BTreeMap::new();

        for printer in printers {
            let Some(object) = printer.as_object() else {
                tracing::debug!("skipping printer entry that is not an object");
                continue;
            };

            let Some(serial) = serial_of(&printer) else {
                tracing::debug!(
                    keys = format!("{:?}", object.keys().collect::<Vec<_>>()),
                    "skipping printer without serial"
                );
                continue;
            };

            by_serial.insert(serial, printer);
        }

        Self { printers: by_serial }
    }

    /// Return the raw object for a serial.
    pub fn get(&self, serial: &str) -> Option<&Value> {
        self.printers.get(serial)
    }

    /// Return a typed view of the printer with the given serial.
    pub fn printer(&self, serial: &str) -> Option<Printer<'_>> {
        self.get(serial).map(Printer::new)
    }

    /// Iterate over all serials, in order.
    pub fn serials(&self) -> impl Iterator<Item = &str> {
        self.printers.keys().map(String::as_str)
    }

    /// Iterate over all printers, in serial order.
    pub fn printers(&self) -> impl Iterator<Item = (&str, Printer<'_>)> {
        self.printers
            .iter()
            .map(|(serial, raw)| (serial.as_str(), Printer::new(raw)))
    }

    /// Number of printers.
    pub fn len(&self) -> usize {
        self.printers.len()
    }

    /// True if the snapshot holds no printers.
    pub fn is_empty(&self) -> bool {
        self.printers.is_empty()
    }
}

/// Serials are normally strings, but numbers are accepted and rendered the
/// way the api would print them. Empty strings count as missing.
fn serial_of(printer: &Value) -> Option<String> {
    match printer.get("serial")? {
        Value::String(serial) if !serial.is_empty() => Some(serial.clone()),
        Value::Number(serial) => Some(serial.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_printers_without_serial_are_dropped() {
        let snapshot = Snapshot::from_printers(vec![
            json!({"serial": "A", "alias": "first"}),
            json!({"serial": "B", "alias": "second"}),
            json!({"serial": null, "alias": "ghost"}),
        ]);

        assert_eq!(snapshot.serials().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(snapshot.get("A"), Some(&json!({"serial": "A", "alias": "first"})));
    }

    #[test]
    fn test_unusable_entries_are_dropped() {
        let snapshot = Snapshot::from_printers(vec![
            json!({"alias": "no serial key"}),
            json!({"serial": ""}),
            json!({"serial": false}),
            json!({"serial": ["A"]}),
            json!("not an object"),
            json!(null),
        ]);

        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_numeric_serials_are_stringified() {
        let snapshot = Snapshot::from_printers(vec![json!({"serial": 1234})]);
        assert_eq!(snapshot.serials().collect::<Vec<_>>(), vec!["1234"]);
    }

    #[test]
    fn test_duplicate_serial_keeps_last() {
        let snapshot = Snapshot::from_printers(vec![
            json!({"serial": "A", "alias": "old"}),
            json!({"serial": "A", "alias": "new"}),
        ]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("A"), Some(&json!({"serial": "A", "alias": "new"})));
    }

    #[test]
    fn test_serializes_as_plain_mapping() {
        let snapshot = Snapshot::from_printers(vec![json!({"serial": "B"}), json!({"serial": "A"})]);
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            json!({"A": {"serial": "A"}, "B": {"serial": "B"}})
        );
    }
}
