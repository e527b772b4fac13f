use color_eyre::{Result, eyre};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
	data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
	#[serde(default)]
	index: Option<usize>,
	embedding: Vec<f32>,
}

/// Embeds a batch of texts in one call.
///
/// Vectors come back aligned with the input order: providers may return
/// items out of order, so each one is slotted by its reported index, and the
/// call fails if any input ends up without exactly one vector.
pub async fn embed(
	cfg: &vitae_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let response: EmbeddingResponse = client
		.post(url)
		.headers(crate::bearer_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;

	align_vectors(response, texts.len())
}

fn align_vectors(response: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
	if response.data.len() != expected {
		return Err(eyre::eyre!(
			"Embedding response carries {} vectors for {expected} inputs.",
			response.data.len()
		));
	}

	let mut slots: Vec<Option<Vec<f32>>> = (0..expected).map(|_| None).collect();

	for (position, item) in response.data.into_iter().enumerate() {
		let slot = item.index.unwrap_or(position);
		let Some(target) = slots.get_mut(slot) else {
			return Err(eyre::eyre!("Embedding index {slot} is out of range."));
		};

		if target.replace(item.embedding).is_some() {
			return Err(eyre::eyre!("Embedding index {slot} appears twice."));
		}
	}

	slots
		.into_iter()
		.map(|slot| {
			slot.ok_or_else(|| eyre::eyre!("Embedding response left an input without a vector."))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn response(raw: serde_json::Value) -> EmbeddingResponse {
		serde_json::from_value(raw).expect("deserialize failed")
	}

	#[test]
	fn vectors_are_realigned_by_reported_index() {
		let parsed = align_vectors(
			response(serde_json::json!({
				"data": [
					{ "index": 1, "embedding": [2.0, 3.0] },
					{ "index": 0, "embedding": [0.5, 1.5] }
				]
			})),
			2,
		)
		.expect("align failed");

		assert_eq!(parsed, vec![vec![0.5, 1.5], vec![2.0, 3.0]]);
	}

	#[test]
	fn missing_indices_fall_back_to_response_order() {
		let parsed = align_vectors(
			response(serde_json::json!({
				"data": [
					{ "embedding": [1.0] },
					{ "embedding": [2.0] }
				]
			})),
			2,
		)
		.expect("align failed");

		assert_eq!(parsed, vec![vec![1.0], vec![2.0]]);
	}

	#[test]
	fn count_mismatch_and_duplicate_indices_fail() {
		let short = response(serde_json::json!({ "data": [ { "embedding": [1.0] } ] }));

		assert!(align_vectors(short, 2).is_err());

		let duplicated = response(serde_json::json!({
			"data": [
				{ "index": 0, "embedding": [1.0] },
				{ "index": 0, "embedding": [2.0] }
			]
		}));

		assert!(align_vectors(duplicated, 2).is_err());
	}
}
