//! Field lookup over arbitrary JSON documents.

// crates.io
use serde_json::Value;

/// Collects every value stored under `name`, at any depth, in document order.
///
/// Matched values are searched as well, so a field nested inside another match is also
/// returned.
pub fn find_fields<'a>(document: &'a Value, name: &str) -> Vec<&'a Value> {
	let mut found = Vec::new();

	collect(document, name, &mut found);

	found
}

/// Returns the sole occurrence of `name`, or the number of occurrences found otherwise.
pub fn find_unique_field<'a>(document: &'a Value, name: &str) -> Result<&'a Value, usize> {
	match find_fields(document, name).as_slice() {
		[value] => Ok(*value),
		found => Err(found.len()),
	}
}

/// Text form of a field: strings verbatim, everything else as JSON text.
pub fn field_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.to_owned(),
		other => other.to_string(),
	}
}

fn collect<'a>(value: &'a Value, name: &str, found: &mut Vec<&'a Value>) {
	match value {
		Value::Object(members) =>
			for (key, member) in members {
				if key == name {
					found.push(member);
				}

				collect(member, name, found);
			},
		Value::Array(items) => items.iter().for_each(|item| collect(item, name, found)),
		_ => (),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn finds_fields_at_any_depth() {
		let document = json!({
			"access_token": "T1",
			"nested": { "access_token": "T2" },
			"list": [{ "access_token": 3 }]
		});
		let found = find_fields(&document, "access_token");

		assert_eq!(found.len(), 3);
		assert_eq!(find_unique_field(&document, "access_token"), Err(3));
		assert_eq!(find_unique_field(&document, "missing"), Err(0));
	}

	#[test]
	fn unique_field_text() {
		let document = json!({ "data": { "refresh_token": "R1", "expires_in": 21600 } });

		assert_eq!(
			find_unique_field(&document, "refresh_token").map(field_text),
			Ok("R1".to_owned())
		);
		assert_eq!(find_unique_field(&document, "expires_in").map(field_text), Ok("21600".into()));
	}
}
