use serde_json::Value;

/// Renders a nested profile record as indented plain text.
///
/// This is the text handed to the embedding indexer and shown alongside
/// search results. Keys starting with `_` are treated as system fields and
/// skipped.
pub fn profile_text(record: &Value) -> String {
	let mut out = String::new();

	render_value(&mut out, record, 0);

	out.trim_end().to_string()
}

fn render_value(out: &mut String, value: &Value, indent_level: usize) {
	let indent = "  ".repeat(indent_level);

	match value {
		Value::Object(entries) => {
			for (key, value) in entries {
				if key.starts_with('_') {
					continue;
				}

				match value {
					Value::Object(_) | Value::Array(_) => {
						out.push_str(&format!("{indent}{}:\n", capitalize(key)));
						render_value(out, value, indent_level + 1);
					},
					scalar => {
						out.push_str(&format!(
							"{indent}{}: {}\n",
							capitalize(key),
							scalar_text(scalar)
						));
					},
				}
			}
		},
		Value::Array(items) => {
			for item in items {
				match item {
					Value::Object(_) | Value::Array(_) => render_value(out, item, indent_level),
					scalar => out.push_str(&format!("{indent}- {}\n", scalar_text(scalar))),
				}
			}
		},
		scalar => out.push_str(&format!("{indent}{}\n", scalar_text(scalar))),
	}
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

fn capitalize(key: &str) -> String {
	let mut chars = key.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
		None => String::new(),
	}
}
