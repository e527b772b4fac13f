use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use uuid::Uuid;

use crate::{
	VitaeService, prompt,
	search::{Candidate, SearchResult},
};

impl VitaeService {
	/// Stage-2 relevance pass: one batched completion call over the whole
	/// candidate set, parsed line by line.
	pub(crate) async fn rerank_candidates(
		&self,
		job_description: &str,
		candidates: &[Candidate],
	) -> color_eyre::Result<Vec<SearchResult>> {
		let prompt = prompt::rerank_prompt(job_description, candidates);
		let response = self
			.providers
			.completion
			.complete(&self.cfg.providers.completion, prompt::RERANK_SYSTEM, &prompt)
			.await?;

		Ok(parse_rerank_response(&response, candidates))
	}
}

/// Parses re-rank output against the `identifier, score, reason` grammar.
///
/// Lines that do not match, and identifiers outside the candidate set, are
/// dropped with a warning. The first occurrence wins when an identifier
/// repeats. Scores are clamped to [0, 1] and rounded to four decimals.
pub(crate) fn parse_rerank_response(
	response: &str,
	candidates: &[Candidate],
) -> Vec<SearchResult> {
	let similarities: HashMap<Uuid, f32> = candidates
		.iter()
		.map(|candidate| (candidate.profile_id, candidate.similarity))
		.collect();
	let mut seen = HashSet::new();
	let mut results = Vec::new();

	for line in response.lines() {
		let line = line.trim();

		if line.is_empty() || line == "---" {
			continue;
		}

		let Some((profile_id, score, reason)) = parse_rerank_line(line) else {
			tracing::warn!(line, "Dropping re-rank line that does not match the grammar.");

			continue;
		};
		let Some(&similarity) = similarities.get(&profile_id) else {
			tracing::warn!(%profile_id, "Dropping re-rank line for an unknown identifier.");

			continue;
		};

		if !seen.insert(profile_id) {
			continue;
		}

		results.push(SearchResult { profile_id, similarity, score: round_score(score), reason });
	}

	results
}

/// Threshold filter plus the final ordering: score descending, ties broken by
/// the original candidate order.
pub(crate) fn filter_and_rank(
	results: Vec<SearchResult>,
	candidates: &[Candidate],
	threshold: f32,
) -> Vec<SearchResult> {
	let order: HashMap<Uuid, usize> = candidates
		.iter()
		.enumerate()
		.map(|(idx, candidate)| (candidate.profile_id, idx))
		.collect();
	let mut kept: Vec<SearchResult> =
		results.into_iter().filter(|result| result.score >= threshold).collect();

	kept.sort_by(|left, right| {
		cmp_f32_desc(left.score, right.score).then_with(|| {
			let lhs = order.get(&left.profile_id).copied().unwrap_or(usize::MAX);
			let rhs = order.get(&right.profile_id).copied().unwrap_or(usize::MAX);

			lhs.cmp(&rhs)
		})
	});

	kept
}

/// One grammar line: `identifier, score, reason`. `Document ID:` / `Score:` /
/// `Reason:` label prefixes are tolerated and stripped.
fn parse_rerank_line(line: &str) -> Option<(Uuid, f32, String)> {
	let mut fields = line.splitn(3, ',');
	let id_field = strip_label(fields.next()?.trim());
	let score_field = strip_label(fields.next()?.trim());
	let reason_field = strip_label(fields.next().unwrap_or("").trim());
	let profile_id = Uuid::parse_str(id_field).ok()?;
	let score: f32 = score_field.parse().ok()?;

	if !score.is_finite() {
		return None;
	}

	Some((profile_id, score, reason_field.to_string()))
}

/// Strips a leading `Label:` when the label part is plain words; reasons that
/// legitimately contain colons deeper in keep them.
fn strip_label(field: &str) -> &str {
	let Some((label, rest)) = field.split_once(':') else {
		return field;
	};

	if !label.is_empty()
		&& label.chars().all(|ch| ch.is_alphanumeric() || ch.is_whitespace() || ch == '_')
	{
		rest.trim()
	} else {
		field
	}
}

pub(crate) fn round_score(score: f32) -> f32 {
	(score.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}

pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
