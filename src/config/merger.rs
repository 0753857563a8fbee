//! Layering of YAML configuration values.
//!
//! `config.local.yml` is laid over `config.yml` before the result is
//! deserialized:
//!
//! - Mappings are merged key by key, recursively
//! - Sequences (e.g. `probes`) are replaced as a whole
//! - A `null` in the overlay removes the key
//! - Any other overlay value replaces the base value

use serde_yaml::Value;

/// Lay `overlay` over `base`.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    let (Value::Mapping(base_map), Value::Mapping(overlay_map)) = (base, overlay) else {
        return overlay.clone();
    };

    let mut merged = base_map.clone();
    for (key, value) in overlay_map {
        if value.is_null() {
            merged.remove(key);
            continue;
        }
        let next = match base_map.get(key) {
            Some(existing) => deep_merge(existing, value),
            None => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    Value::Mapping(merged)
}

/// Merge layers in order; the last layer wins.
pub fn merge_configs(configs: &[Value]) -> Value {
    configs
        .iter()
        .fold(Value::Mapping(Default::default()), |acc, layer| {
            deep_merge(&acc, layer)
        })
}
