//! Configuration layers and the deep-merge rule.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Well-known layer priorities.
pub struct LayerPriority;

impl LayerPriority {
    pub const FALLBACK: i32 = 0;
    pub const COMPLIANCE: i32 = 100;
    pub const ENVIRONMENT: i32 = 200;
    pub const SETTINGS_ENVIRONMENT: i32 = 250;
    pub const MANIFEST: i32 = 300;
    pub const GOVERNANCE: i32 = 400;
}

/// One prioritized contribution to a component configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigLayer {
    pub name: String,
    pub priority: i32,
    pub config: Value,
}

impl ConfigLayer {
    pub fn new(name: impl Into<String>, priority: i32, config: Value) -> Self {
        Self {
            name: name.into(),
            priority,
            config,
        }
    }

    /// A layer contributes nothing when its fragment is null or an empty map.
    pub fn is_empty(&self) -> bool {
        match &self.config {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }
}

/// Merge `overlay` into `base`.
///
/// Maps on both sides are merged key by key. Any other overlay value replaces
/// the base value outright, except `null`, which never overrides.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => {
                        if !overlay_value.is_null() {
                            base_map.insert(key.clone(), strip_nulls(overlay_value));
                        }
                    }
                }
            }
        }
        (base, overlay) => {
            *base = strip_nulls(overlay);
        }
    }
}

/// Nulls nested in a fresh subtree are dropped so they never surface as values.
fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Merge layers in ascending priority order.
///
/// Layers with equal priority are applied in the order given. Every layer
/// fragment must be a map (or null).
pub fn merge_layers(layers: &[ConfigLayer]) -> ConfigResult<Value> {
    let mut ordered: Vec<&ConfigLayer> = layers.iter().collect();
    ordered.sort_by_key(|layer| layer.priority);

    let mut merged = Value::Object(Map::new());
    for layer in ordered {
        match &layer.config {
            Value::Null => continue,
            Value::Object(_) => {
                debug!("Merging layer '{}' (priority {})", layer.name, layer.priority);
                deep_merge(&mut merged, &layer.config);
            }
            other => {
                return Err(ConfigError::InvalidLayer {
                    layer: layer.name.clone(),
                    message: format!("expected a map, found {}", json_type(other)),
                });
            }
        }
    }

    Ok(merged)
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
