use color_eyre::{Result, eyre};
use serde_json::Value;

/// One text-completion call. No streaming, no automatic re-prompting; a
/// malformed payload is the caller's problem to classify.
pub async fn complete(
	cfg: &vitae_config::CompletionProviderConfig,
	system: &str,
	prompt: &str,
) -> Result<String> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"max_tokens": cfg.max_tokens,
		"messages": [
			{ "role": "system", "content": system },
			{ "role": "user", "content": prompt },
		],
	});
	let res = client
		.post(url)
		.headers(crate::bearer_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_response(json)
}

fn parse_completion_response(json: Value) -> Result<String> {
	if let Some(content) = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
	{
		return Ok(content.trim().to_string());
	}

	// Anthropic-style responses carry a list of content blocks instead.
	if let Some(blocks) = json.get("content").and_then(|v| v.as_array()) {
		let mut out = String::new();

		for block in blocks {
			if let Some(text) = block.get("text").and_then(|t| t.as_str()) {
				out.push_str(text);
			}
		}

		if !out.trim().is_empty() {
			return Ok(out.trim().to_string());
		}
	}

	Err(eyre::eyre!("Completion response is missing text content."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_chat_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "  {\"nome\": \"Ada\"}  " } }
			]
		});
		let text = parse_completion_response(json).expect("parse failed");
		assert_eq!(text, "{\"nome\": \"Ada\"}");
	}

	#[test]
	fn joins_content_blocks() {
		let json = serde_json::json!({
			"content": [
				{ "type": "text", "text": "{\"nome\":" },
				{ "type": "text", "text": " \"Ada\"}" }
			]
		});
		let text = parse_completion_response(json).expect("parse failed");
		assert_eq!(text, "{\"nome\": \"Ada\"}");
	}

	#[test]
	fn rejects_payload_without_text() {
		let json = serde_json::json!({ "choices": [] });
		assert!(parse_completion_response(json).is_err());
	}
}
