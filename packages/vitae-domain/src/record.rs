use serde_json::Value;
use uuid::Uuid;

use crate::sanitize;

/// A structured candidate profile: a pruned JSON object keyed by `profile_id`.
///
/// The record body always carries its own `id` entry so the persisted document
/// is self-describing.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateRecord {
	pub profile_id: Uuid,
	pub record: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordReject {
	NotAnObject,
	Empty,
}

impl CandidateRecord {
	/// Builds a record from a model response: prune empties, then reuse an
	/// embedded `id` when it parses as a UUID, otherwise assign a fresh one.
	pub fn from_response(response: Value) -> Result<Self, RecordReject> {
		if !response.is_object() {
			return Err(RecordReject::NotAnObject);
		}

		let Some(pruned) = sanitize::prune(response) else {
			return Err(RecordReject::Empty);
		};
		let Value::Object(mut entries) = pruned else {
			return Err(RecordReject::NotAnObject);
		};
		let profile_id = entries
			.get("id")
			.and_then(Value::as_str)
			.and_then(|raw| Uuid::parse_str(raw).ok())
			.unwrap_or_else(Uuid::new_v4);

		entries.insert("id".to_string(), Value::String(profile_id.to_string()));

		Ok(Self { profile_id, record: Value::Object(entries) })
	}
}
