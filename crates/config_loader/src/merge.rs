//! Layered merge of untyped configuration trees.
//!
//! Tables merge key by key, recursively. Scalars and arrays from the overlay
//! replace the base value.

use toml::Value;

/// Merge `overlay` on top of `base` in place.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
