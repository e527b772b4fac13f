use std::sync::atomic::Ordering;

use uuid::Uuid;

use vitae_service::{Error, RetrieveRequest, Threshold};

use super::*;

const JOB_DESCRIPTION: &str = "Senior Rust engineer for a search infrastructure team.";

fn id(n: u128) -> Uuid {
	Uuid::from_u128(n)
}

fn request(threshold: Threshold) -> RetrieveRequest {
	RetrieveRequest {
		job_description: JOB_DESCRIPTION.to_string(),
		threshold,
		candidate_k: None,
	}
}

#[tokio::test]
async fn empty_job_description_is_an_invalid_request() {
	let harness = harness(test_config());
	let err = harness
		.service
		.retrieve(RetrieveRequest {
			job_description: "  ".to_string(),
			threshold: Threshold::Fixed(0.65),
			candidate_k: None,
		})
		.await
		.expect_err("expected an invalid request error");

	assert!(matches!(err, Error::InvalidRequest { .. }));
}

#[tokio::test]
async fn no_candidates_returns_empty_without_a_rerank_call() {
	let harness = harness(test_config());

	harness.vectors.push_search_response(Vec::new());

	let response =
		harness.service.retrieve(request(Threshold::Fixed(0.65))).await.expect("retrieve failed");

	assert!(response.results.is_empty());
	assert!(!response.degraded);
	assert_eq!(harness.completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn threshold_filters_and_orders_results() {
	let harness = harness(test_config());

	harness.vectors.push_search_response(vec![
		hit(id(1), 0.91, "profile one"),
		hit(id(2), 0.84, "profile two"),
		hit(id(3), 0.77, "profile three"),
		hit(id(4), 0.70, "profile four"),
	]);
	harness.completion.push_response(&format!(
		"{}, 0.9, excellent fit\n{}, 0.7, very close\n{}, 0.5, partial fit\n{}, 0.3, weak fit",
		id(2),
		id(1),
		id(3),
		id(4)
	));

	let response =
		harness.service.retrieve(request(Threshold::Fixed(0.65))).await.expect("retrieve failed");

	assert!(!response.degraded);
	assert_eq!(response.results.len(), 2);
	assert_eq!(response.results[0].profile_id, id(2));
	assert_eq!(response.results[0].score, 0.9);
	assert_eq!(response.results[1].profile_id, id(1));
	assert_eq!(response.results[1].score, 0.7);

	for result in &response.results {
		assert!(result.score >= 0.65);
	}
}

#[tokio::test]
async fn duplicate_identifiers_keep_the_first_line() {
	let harness = harness(test_config());

	harness.vectors.push_search_response(vec![hit(id(1), 0.9, "profile one")]);
	harness
		.completion
		.push_response(&format!("{}, 0.9, first verdict\n{}, 0.4, second verdict", id(1), id(1)));

	let response =
		harness.service.retrieve(request(Threshold::Fixed(0.1))).await.expect("retrieve failed");

	assert_eq!(response.results.len(), 1);
	assert_eq!(response.results[0].score, 0.9);
	assert_eq!(response.results[0].reason, "first verdict");
}

#[tokio::test]
async fn fragment_hits_deduplicate_by_profile() {
	let harness = harness(test_config());

	harness.vectors.push_search_response(vec![
		hit(id(1), 0.9, "fragment a"),
		hit(id(1), 0.6, "fragment b"),
		hit(id(2), 0.8, "fragment c"),
	]);
	harness
		.completion
		.push_response(&format!("{}, 0.9, strong\n{}, 0.8, good", id(1), id(2)));

	let response =
		harness.service.retrieve(request(Threshold::Fixed(0.1))).await.expect("retrieve failed");

	assert_eq!(response.results.len(), 2);
	assert_eq!(response.results[0].profile_id, id(1));
	assert_eq!(response.results[1].profile_id, id(2));
}

#[tokio::test]
async fn rerank_outage_degrades_to_stage_one_order() {
	let harness = harness(test_config());

	harness.vectors.push_search_response(vec![
		hit(id(1), 0.91, "profile one"),
		hit(id(2), 0.84, "profile two"),
		hit(id(3), 0.77, "profile three"),
	]);
	harness.completion.push_failure("gateway timeout");

	let response =
		harness.service.retrieve(request(Threshold::Fixed(0.65))).await.expect("retrieve failed");

	assert!(response.degraded);
	assert_eq!(
		response.results.iter().map(|result| result.profile_id).collect::<Vec<_>>(),
		vec![id(1), id(2), id(3)]
	);

	for result in &response.results {
		assert_eq!(result.score, 1.0);
		assert!(result.reason.is_empty());
	}
}

#[tokio::test]
async fn expansion_union_falls_back_to_the_direct_query() {
	let mut cfg = test_config();

	cfg.search.expansion.mode = "always".to_string();

	let harness = harness(cfg);

	// Expansion call first, then the re-rank call.
	harness
		.completion
		.push_response("{\"queries\": [\"rust search engineer\", \"vector database engineer\"]}");
	harness.completion.push_response(&format!("{}, 0.8, solid match", id(7)));

	// Three expanded queries all come back empty; the direct retry hits.
	harness.vectors.push_search_response(Vec::new());
	harness.vectors.push_search_response(Vec::new());
	harness.vectors.push_search_response(Vec::new());
	harness.vectors.push_search_response(vec![hit(id(7), 0.72, "late hit")]);

	let response =
		harness.service.retrieve(request(Threshold::Fixed(0.65))).await.expect("retrieve failed");

	assert_eq!(harness.vectors.search_calls.load(Ordering::SeqCst), 4);
	assert_eq!(response.results.len(), 1);
	assert_eq!(response.results[0].profile_id, id(7));
}

#[tokio::test]
async fn dynamic_threshold_falls_back_on_a_lone_candidate() {
	let harness = harness(test_config());

	harness.vectors.push_search_response(vec![hit(id(1), 0.9, "only profile")]);
	// 0.6 sits below the configured fallback threshold of 0.65.
	harness.completion.push_response(&format!("{}, 0.6, partial fit", id(1)));

	let response =
		harness.service.retrieve(request(Threshold::Dynamic)).await.expect("retrieve failed");

	assert!(response.results.is_empty());
}

#[tokio::test]
async fn fetch_misses_return_none() {
	let harness = harness(test_config());

	assert!(harness.service.fetch_profile(id(123)).await.expect("fetch failed").is_none());
	assert!(harness.service.fetch_attachment(id(123)).await.expect("fetch failed").is_none());
}
