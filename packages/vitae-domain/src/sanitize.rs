use serde_json::Value;

/// Recursively prunes empty values from a model response.
///
/// Null, blank strings, the literal string `"null"`, empty arrays, and empty
/// objects are all treated as absent. An object entry whose value prunes to
/// nothing is dropped; an array that loses every element collapses to absent
/// at its parent. Numbers and booleans pass through untouched.
pub fn prune(value: Value) -> Option<Value> {
	match value {
		Value::Null => None,
		Value::String(text) => {
			let trimmed = text.trim();

			if trimmed.is_empty() || trimmed == "null" {
				None
			} else {
				Some(Value::String(trimmed.to_string()))
			}
		},
		Value::Array(items) => {
			let pruned: Vec<Value> = items.into_iter().filter_map(prune).collect();

			if pruned.is_empty() { None } else { Some(Value::Array(pruned)) }
		},
		Value::Object(entries) => {
			let mut pruned = serde_json::Map::new();

			for (key, value) in entries {
				if let Some(value) = prune(value) {
					pruned.insert(key, value);
				}
			}

			if pruned.is_empty() { None } else { Some(Value::Object(pruned)) }
		},
		other => Some(other),
	}
}
