// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strip a property from a JSON document at every depth.

use serde_json::Value;

/// Remove every object key equal to `name`, recursing through objects and
/// arrays. Returns how many keys were removed.
pub fn remove_nested_property(value: &mut Value, name: &str) -> usize {
    match value {
        Value::Array(items) => items.iter_mut().map(|item| remove_nested_property(item, name)).sum(),
        Value::Object(map) => {
            let mut removed = usize::from(map.remove(name).is_some());
            for child in map.values_mut() {
                removed += remove_nested_property(child, name);
            }
            removed
        }
        _ => 0,
    }
}
