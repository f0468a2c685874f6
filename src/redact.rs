//! Scrubbing of credentials from vendor payloads before they leave the
//! process.

use serde_json::{Map, Value};

/// Replacement for every sensitive value.
pub const REDACTED: &str = "***REDACTED***";

/// Lowercase key fragments that mark a value as sensitive.
const SENSITIVE: &[&str] = &[
    "token",
    "secret",
    "password",
    "authorization",
    "cookie",
    "signature",
    "email",
    "credential",
    "api_key",
];

/// Copy `value`, replacing the value of every object key that looks
/// sensitive with [REDACTED]. Arrays and nested objects are walked; the
/// shape of the document is kept.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, value)| {
                    let value = if is_sensitive(key) {
                        Value::String(REDACTED.to_owned())
                    } else {
                        redact(value)
                    };
                    (key.clone(), value)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE.iter().any(|fragment| key.contains(fragment))
}
