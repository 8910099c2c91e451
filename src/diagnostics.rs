use crate::entry::LoadedEntry;
use serde_json::{json, Map, Value};

pub const REDACTED: &str = "**REDACTED**";

const TO_REDACT: [&str; 2] = ["username", "password"];

/// Replaces the value of every key in `keys` with [`REDACTED`], at any depth.
pub fn redact(value: Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .map(|(key, value)| {
                    let value = if keys.contains(&key.as_str()) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact(value, keys)
                    };
                    (key, value)
                })
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| redact(item, keys)).collect())
        }
        other => other,
    }
}

/// Entry, coordinator status and data of `loaded`, with credentials redacted.
pub fn entry_diagnostics(loaded: &LoadedEntry) -> Result<Value, serde_json::Error> {
    let coordinator = &loaded.coordinator;
    let entry = serde_json::to_value(&loaded.entry)?;
    let data = serde_json::to_value(coordinator.data().as_deref())?;
    let status = json!({
        "name": coordinator.name(),
        "meter_id": coordinator.meter_id(),
        "last_update_success": coordinator.is_available(),
        "last_error": coordinator.last_error(),
    });
    Ok(redact(
        json!({ "entry": entry, "coordinator": status, "data": data }),
        &TO_REDACT,
    ))
}
