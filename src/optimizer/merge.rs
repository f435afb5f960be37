//! Deep merge of JSON configuration overlays.

use serde_json::Value;

/// Merges `overrides` into `base`.
///
/// Objects merge key by key, recursively. Any other override value
/// (including arrays) replaces the base value. A top-level `null` override
/// leaves `base` untouched.
pub fn merge_json(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(over_map)) => {
            for (key, value) in over_map {
                if let Some(existing) = base_map.get_mut(key) {
                    if existing.is_object() && value.is_object() {
                        merge_json(existing, value);
                        continue;
                    }
                }
                base_map.insert(key.clone(), value.clone());
            }
        }
        (base, other) => *base = other.clone(),
    }
}
