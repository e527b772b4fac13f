use std::collections::HashMap;

use uuid::Uuid;

use crate::{
	Error, FragmentHit, ServiceResult, VitaeService, prompt, rerank,
	structuring::parse_json_response, validate_vector_dim,
};

pub(crate) const PLACEHOLDER_SCORE: f32 = 1.0;

/// Stage-2 score threshold policy. `Dynamic` derives the cut from the stage-1
/// similarity spread (mean minus half a standard deviation) and falls back to
/// the configured fixed threshold when the spread is uninformative.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Threshold {
	Fixed(f32),
	Dynamic,
}

#[derive(Clone, Debug)]
pub struct RetrieveRequest {
	pub job_description: String,
	pub threshold: Threshold,
	pub candidate_k: Option<u32>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct SearchResult {
	pub profile_id: Uuid,
	pub similarity: f32,
	pub score: f32,
	pub reason: String,
}

#[derive(Clone, Debug)]
pub struct RetrieveResponse {
	pub results: Vec<SearchResult>,
	pub degraded: bool,
}

/// A stage-1 candidate: the best-matching fragment per profile.
#[derive(Clone, Debug)]
pub struct Candidate {
	pub profile_id: Uuid,
	pub similarity: f32,
	pub text: String,
}

#[derive(Debug, serde::Deserialize)]
struct ExpansionOutput {
	queries: Vec<String>,
}

impl VitaeService {
	/// Ranks stored candidates against a job description.
	///
	/// Stage 1 generates a candidate set by vector similarity (optionally
	/// unioned over LLM-expanded query paraphrases); stage 2 re-ranks it with
	/// a single batched completion call. A failed re-rank degrades to the
	/// unranked stage-1 set instead of failing the query.
	pub async fn retrieve(&self, req: RetrieveRequest) -> ServiceResult<RetrieveResponse> {
		let query = req.job_description.trim();

		if query.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Job description must be non-empty.".to_string(),
			});
		}

		let candidate_k = req.candidate_k.unwrap_or(self.cfg.search.candidate_k).max(1);
		let candidates = self.collect_candidates(query, candidate_k).await?;

		if candidates.is_empty() {
			return Ok(RetrieveResponse { results: Vec::new(), degraded: false });
		}

		let threshold = self.resolve_threshold(req.threshold, &candidates);

		match self.rerank_candidates(query, &candidates).await {
			Ok(scored) => {
				let results = rerank::filter_and_rank(scored, &candidates, threshold);

				Ok(RetrieveResponse { results, degraded: false })
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					"Re-ranking call failed. Returning stage-one candidates unranked."
				);

				let results = candidates
					.iter()
					.map(|candidate| SearchResult {
						profile_id: candidate.profile_id,
						similarity: candidate.similarity,
						score: PLACEHOLDER_SCORE,
						reason: String::new(),
					})
					.collect();

				Ok(RetrieveResponse { results, degraded: true })
			},
		}
	}

	async fn collect_candidates(
		&self,
		query: &str,
		candidate_k: u32,
	) -> ServiceResult<Vec<Candidate>> {
		let queries = match self.cfg.search.expansion.mode.as_str() {
			"always" => self.expand_queries(query).await,
			_ => vec![query.to_string()],
		};
		let mut hits = self.run_similarity_queries(&queries, candidate_k).await?;

		if hits.is_empty() && queries.len() > 1 {
			tracing::info!("Expanded queries returned no fragments. Falling back to the direct query.");

			hits = self.run_similarity_queries(&[query.to_string()], candidate_k).await?;
		}

		Ok(dedupe_by_profile(hits))
	}

	async fn run_similarity_queries(
		&self,
		queries: &[String],
		candidate_k: u32,
	) -> ServiceResult<Vec<FragmentHit>> {
		let vectors =
			self.providers.embedding.embed(&self.cfg.providers.embedding, queries).await?;

		if vectors.len() != queries.len() {
			return Err(Error::Provider {
				message: "Embedding provider returned mismatched vector count.".to_string(),
			});
		}

		let mut hits = Vec::new();

		for vector in vectors {
			validate_vector_dim(&vector, self.cfg.storage.qdrant.vector_dim)?;
			hits.extend(self.stores.vectors.search(vector, candidate_k).await?);
		}

		Ok(hits)
	}

	async fn expand_queries(&self, query: &str) -> Vec<String> {
		let cfg = &self.cfg.search.expansion;
		let prompt = prompt::expansion_prompt(query, cfg.max_queries);
		let raw = match self
			.providers
			.completion
			.complete(&self.cfg.providers.completion, prompt::EXPANSION_SYSTEM, &prompt)
			.await
		{
			Ok(text) => text,
			Err(err) => {
				tracing::warn!(error = %err, "Query expansion failed. Falling back to the original query.");

				return vec![query.to_string()];
			},
		};
		let parsed: ExpansionOutput =
			match parse_json_response(&raw).and_then(serde_json::from_value) {
				Ok(parsed) => parsed,
				Err(err) => {
					tracing::warn!(error = %err, "Query expansion returned invalid JSON. Falling back to the original query.");

					return vec![query.to_string()];
				},
			};

		normalize_queries(parsed.queries, query, cfg.max_queries)
	}

	fn resolve_threshold(&self, threshold: Threshold, candidates: &[Candidate]) -> f32 {
		match threshold {
			Threshold::Fixed(value) => value,
			Threshold::Dynamic => {
				let similarities: Vec<f32> =
					candidates.iter().map(|candidate| candidate.similarity).collect();

				match dynamic_threshold(&similarities) {
					Some(value) => {
						tracing::info!(threshold = value, "Dynamic threshold resolved.");

						value
					},
					None => self.cfg.search.score_threshold,
				}
			},
		}
	}
}

/// Collapses fragment hits to one candidate per profile, keeping the
/// best-scoring fragment, ordered by similarity descending.
fn dedupe_by_profile(hits: Vec<FragmentHit>) -> Vec<Candidate> {
	let mut candidates: Vec<Candidate> = Vec::new();
	let mut positions: HashMap<Uuid, usize> = HashMap::new();

	for hit in hits {
		match positions.get(&hit.profile_id).copied() {
			Some(pos) =>
				if hit.score > candidates[pos].similarity {
					candidates[pos].similarity = hit.score;
					candidates[pos].text = hit.text;
				},
			None => {
				positions.insert(hit.profile_id, candidates.len());
				candidates.push(Candidate {
					profile_id: hit.profile_id,
					similarity: hit.score,
					text: hit.text,
				});
			},
		}
	}

	candidates.sort_by(|left, right| rerank::cmp_f32_desc(left.similarity, right.similarity));

	candidates
}

fn normalize_queries(queries: Vec<String>, original: &str, max_queries: u32) -> Vec<String> {
	let mut out = vec![original.to_string()];

	for query in queries {
		let trimmed = query.trim();

		if trimmed.is_empty() || out.iter().any(|existing| existing == trimmed) {
			continue;
		}
		if out.len() >= max_queries as usize {
			break;
		}

		out.push(trimmed.to_string());
	}

	out
}

/// Mean minus half a standard deviation; `None` when fewer than two scores
/// make the statistic meaningless.
fn dynamic_threshold(scores: &[f32]) -> Option<f32> {
	if scores.len() < 2 {
		return None;
	}

	let mean = scores.iter().sum::<f32>() / scores.len() as f32;
	let variance =
		scores.iter().map(|score| (score - mean).powi(2)).sum::<f32>() / scores.len() as f32;

	Some(mean - 0.5 * variance.sqrt())
}
