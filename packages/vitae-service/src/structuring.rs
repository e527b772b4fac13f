use serde_json::Value;

use crate::{Reject, VitaeService, prompt};
use vitae_domain::{CandidateRecord, RecordReject, enrich};
use vitae_providers::projects::Project;

impl VitaeService {
	/// Turns extracted CV text into a validated candidate record.
	///
	/// A pure transform apart from the provider calls: one optional project
	/// lookup and exactly one completion call. Every failure is a rejection
	/// for this document, never an error for the batch, and nothing is
	/// re-prompted.
	pub async fn structure(
		&self,
		extracted_text: &str,
		source_name: &str,
	) -> Result<CandidateRecord, Reject> {
		let text = extracted_text.trim();

		if text.is_empty() {
			tracing::warn!(source = source_name, "Extracted text is empty. Rejecting.");

			return Err(Reject::EmptyText);
		}

		let projects = self.fetch_projects_for(text).await;
		let (prompt, truncated) = prompt::truncate_prompt(
			prompt::structuring_prompt(text, &projects),
			self.cfg.ingest.prompt_char_budget,
		);

		if truncated {
			tracing::warn!(
				source = source_name,
				budget = self.cfg.ingest.prompt_char_budget,
				"Prompt exceeded the character budget. Truncating."
			);
		}

		let response = match self
			.providers
			.completion
			.complete(&self.cfg.providers.completion, prompt::STRUCTURING_SYSTEM, &prompt)
			.await
		{
			Ok(response) => response,
			Err(err) => {
				tracing::error!(error = %err, source = source_name, "Completion call failed.");

				return Err(Reject::CompletionFailed);
			},
		};
		let value = match parse_json_response(&response) {
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(error = %err, source = source_name, "Model response is not valid JSON. Rejecting.");

				return Err(Reject::MalformedResponse);
			},
		};

		match CandidateRecord::from_response(value) {
			Ok(record) => Ok(record),
			Err(RecordReject::NotAnObject) => {
				tracing::warn!(source = source_name, "Model response is not a JSON object. Rejecting.");

				Err(Reject::MalformedResponse)
			},
			Err(RecordReject::Empty) => {
				tracing::warn!(source = source_name, "Model response pruned to an empty record. Rejecting.");

				Err(Reject::EmptyRecord)
			},
		}
	}

	/// Project-listing enrichment. Degrades to an empty list on any failure;
	/// enrichment never rejects a document.
	async fn fetch_projects_for(&self, text: &str) -> Vec<Project> {
		let Some(cfg) = self.cfg.providers.projects.as_ref().filter(|cfg| cfg.enabled) else {
			return Vec::new();
		};
		let Some(username) =
			enrich::extract_github_url(text).as_deref().and_then(enrich::extract_username)
		else {
			return Vec::new();
		};

		match self.providers.projects.fetch(cfg, &username).await {
			Ok(projects) => {
				tracing::info!(username = %username, count = projects.len(), "Fetched public projects.");

				projects
			},
			Err(err) => {
				tracing::warn!(error = %err, username = %username, "Project fetch failed. Continuing without enrichment.");

				Vec::new()
			},
		}
	}
}

/// Parses a completion response as JSON, tolerating a markdown code fence
/// around the payload.
pub(crate) fn parse_json_response(response: &str) -> serde_json::Result<Value> {
	serde_json::from_str(strip_code_fence(response))
}

fn strip_code_fence(text: &str) -> &str {
	let trimmed = text.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let Some(body) = rest.strip_suffix("```") else {
		return trimmed;
	};
	// The opening fence may carry a language tag.
	let body = body.strip_prefix("json").unwrap_or(body);

	body.trim()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn parses_plain_json() {
		let value = parse_json_response("{\"nome\": \"Ada\"}").expect("parse failed");
		assert_eq!(value, json!({ "nome": "Ada" }));
	}

	#[test]
	fn parses_fenced_json() {
		let value =
			parse_json_response("```json\n{\"nome\": \"Ada\"}\n```").expect("parse failed");
		assert_eq!(value, json!({ "nome": "Ada" }));

		let value = parse_json_response("```\n{\"nome\": \"Ada\"}\n```").expect("parse failed");
		assert_eq!(value, json!({ "nome": "Ada" }));
	}

	#[test]
	fn rejects_prose() {
		assert!(parse_json_response("Sorry, I cannot do that.").is_err());
	}
}
