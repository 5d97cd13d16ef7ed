//! `{dotted.path}` placeholder substitution for URLs and parameter values.

// self
use crate::_prelude::*;

/// Errors produced while resolving template placeholders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TemplateResolutionError {
	/// A path segment is absent from the substitution context.
	#[error("Placeholder `{{{path}}}` has no `{segment}` segment in the substitution context.")]
	MissingSegment {
		/// Full dotted path of the placeholder.
		path: String,
		/// Segment that failed to resolve.
		segment: String,
	},
	/// The path resolved to a non-scalar value.
	#[error("Placeholder `{{{path}}}` resolves to a non-scalar value.")]
	NotScalar {
		/// Full dotted path of the placeholder.
		path: String,
	},
}

/// Replaces every `{dotted.path}` placeholder in `input` with the scalar it
/// resolves to in `context`.
///
/// Paths traverse nested JSON objects segment by segment; strings substitute
/// verbatim, numbers and booleans via their canonical rendering. A `{` without a
/// closing brace on the same input is passed through literally.
pub fn substitute(
	input: &str,
	context: &serde_json::Value,
) -> Result<String, TemplateResolutionError> {
	let mut output = String::with_capacity(input.len());
	let mut rest = input;

	while let Some(open) = rest.find('{') {
		output.push_str(&rest[..open]);

		let Some(close) = rest[open..].find('}') else {
			output.push_str(&rest[open..]);

			return Ok(output);
		};
		let path = &rest[open + 1..open + close];

		if path.is_empty() {
			output.push_str("{}");
		} else {
			output.push_str(&resolve(path, context)?);
		}

		rest = &rest[open + close + 1..];
	}

	output.push_str(rest);

	Ok(output)
}

fn resolve(path: &str, context: &serde_json::Value) -> Result<String, TemplateResolutionError> {
	let mut cursor = context;

	for segment in path.split('.') {
		cursor = cursor.get(segment).ok_or_else(|| TemplateResolutionError::MissingSegment {
			path: path.to_owned(),
			segment: segment.to_owned(),
		})?;
	}

	match cursor {
		serde_json::Value::String(s) => Ok(s.clone()),
		serde_json::Value::Number(n) => Ok(n.to_string()),
		serde_json::Value::Bool(b) => Ok(b.to_string()),
		_ => Err(TemplateResolutionError::NotScalar { path: path.to_owned() }),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn dotted_paths_traverse_nested_objects() {
		let context = json!({ "user": { "id": 42, "name": "alice" }, "active": true });

		assert_eq!(
			substitute("https://api.example/users/{user.id}?me={user.name}&on={active}", &context)
				.expect("Placeholders should resolve."),
			"https://api.example/users/42?me=alice&on=true",
		);
	}

	#[test]
	fn inputs_without_placeholders_pass_through() {
		assert_eq!(
			substitute("https://api.example/plain", &json!({}))
				.expect("Placeholder-free input should pass through."),
			"https://api.example/plain",
		);
	}

	#[test]
	fn unterminated_braces_are_literal() {
		let context = json!({ "id": 1 });

		assert_eq!(
			substitute("https://api.example/{id}/tail{oops", &context)
				.expect("Unterminated brace should be literal."),
			"https://api.example/1/tail{oops",
		);
	}

	#[test]
	fn missing_segments_name_the_path() {
		let err = substitute("{user.email}", &json!({ "user": { "id": 1 } }))
			.expect_err("Absent segment should fail.");

		assert_eq!(
			err,
			TemplateResolutionError::MissingSegment {
				path: "user.email".into(),
				segment: "email".into(),
			},
		);
	}

	#[test]
	fn non_scalar_targets_are_rejected() {
		let err = substitute("{user}", &json!({ "user": { "id": 1 } }))
			.expect_err("Object target should fail.");

		assert_eq!(err, TemplateResolutionError::NotScalar { path: "user".into() });
	}
}
