//! Profile hydration.
//!
//! Stored player data may be partial: a peer patch may have created a
//! profile with only a name, a restore may predate newer fields. Hydration
//! overlays the canonical defaults onto whatever exists, producing a
//! complete object every time. It is total (any input yields a full
//! profile) and idempotent (hydrating twice changes nothing), and it
//! preserves unknown fields written by peers.

use serde_json::{json, Map, Value};

use idlewild_types::Profile;

/// Overlay canonical defaults onto a stored (possibly partial) profile.
///
/// Non-object input is discarded and replaced by a fully defaulted
/// profile. Fields already present are kept as stored; only missing keys
/// receive defaults. The `equipment` object is defaulted one level deep so
/// a stored `{}` still gains its `weapon` slot.
pub fn hydrate(stored: Option<&Value>) -> Value {
    let mut map = stored
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    ensure(&mut map, "name", json!(""));
    ensure(&mut map, "health", json!(100));
    ensure(&mut map, "stamina", json!(100));
    ensure(&mut map, "experience", json!(0));
    ensure(&mut map, "wealth", json!(0));
    ensure(&mut map, "presence", json!("offline"));
    ensure(&mut map, "inventory", json!([]));
    ensure(&mut map, "effects", json!({}));
    ensure(&mut map, "cooldown", json!(0));

    let equipment = map
        .entry("equipment".to_owned())
        .or_insert_with(|| json!({}));
    if let Some(slots) = equipment.as_object_mut() {
        if !slots.contains_key("weapon") {
            slots.insert("weapon".to_owned(), Value::Null);
        }
    } else {
        *equipment = json!({ "weapon": null });
    }

    Value::Object(map)
}

/// Parse a hydrated profile value into its typed view.
///
/// Falls back to a defaulted profile when stored fields carry impossible
/// types (a corrupt peer write); the caller decides whether to log.
pub fn typed(hydrated: &Value) -> Profile {
    serde_json::from_value(hydrated.clone()).unwrap_or_default()
}

fn ensure(map: &mut Map<String, Value>, key: &str, default: Value) {
    if !map.contains_key(key) {
        map.insert(key.to_owned(), default);
    }
}
