use std::sync::atomic::Ordering;

use vitae_service::{Error, IngestOutcome, Reject};

use super::*;

const CV_TEXT: &str = "Ada Lovelace\nSoftware engineer with Rust and SQL experience.";

fn cv_response(profile_id: &str) -> String {
	format!(
		"```json\n{{\"id\": \"{profile_id}\", \"nome_completo\": \"Ada Lovelace\", \
		 \"competenze_tecniche\": [\"Rust\", \"SQL\"], \"lingue\": [], \"note\": \"\"}}\n```"
	)
}

#[tokio::test]
async fn empty_text_is_rejected_without_a_completion_call() {
	let harness = harness(test_config());
	let outcome = harness
		.service
		.ingest_document("   \n", "empty.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");

	assert_eq!(outcome, IngestOutcome::Rejected { reason: Reject::EmptyText });
	assert_eq!(harness.completion.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn structures_commits_and_indexes_a_document() {
	let harness = harness(test_config());
	let embedded_id = "4f8a1f64-7d2a-4c38-9f1e-0d6b5a2c9e11";

	harness.completion.push_response(&cv_response(embedded_id));

	let outcome = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");
	let IngestOutcome::Committed { profile_id, indexed_fragments } = outcome else {
		panic!("Expected a committed outcome, got {outcome:?}.");
	};

	assert_eq!(profile_id.to_string(), embedded_id);
	assert_eq!(indexed_fragments, 1);

	let record = stored_record(&harness, profile_id).expect("profile missing");

	// Empty sections are pruned before persistence.
	assert!(record.get("lingue").is_none());
	assert!(record.get("note").is_none());
	assert_eq!(record["nome_completo"], serde_json::json!("Ada Lovelace"));
	assert_eq!(record["id"], serde_json::json!(embedded_id));

	let attachments = harness.attachments.rows.lock().expect("poisoned");

	assert_eq!(attachments.get(&profile_id).map(Vec::as_slice), Some(b"%PDF-1.4".as_slice()));

	let points = harness.vectors.points.lock().expect("poisoned");

	assert_eq!(points.len(), 1);
	assert_eq!(points[0].profile_id, profile_id);
	assert!(points[0].text.contains("Ada Lovelace"));
}

#[tokio::test]
async fn malformed_response_is_rejected_without_a_retry() {
	let harness = harness(test_config());

	harness.completion.push_response("I am sorry, I cannot structure this CV.");

	let outcome = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");

	assert_eq!(outcome, IngestOutcome::Rejected { reason: Reject::MalformedResponse });
	// No automatic re-prompt.
	assert_eq!(harness.completion.calls.load(Ordering::SeqCst), 1);
	assert!(harness.profiles.rows.lock().expect("poisoned").is_empty());
}

#[tokio::test]
async fn completion_outage_is_rejected_terminally() {
	let harness = harness(test_config());

	harness.completion.push_failure("connection refused");

	let outcome = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");

	assert_eq!(outcome, IngestOutcome::Rejected { reason: Reject::CompletionFailed });
}

#[tokio::test]
async fn response_pruned_to_nothing_is_rejected() {
	let harness = harness(test_config());

	harness.completion.push_response("{\"nome_completo\": \"\", \"competenze\": []}");

	let outcome = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");

	assert_eq!(outcome, IngestOutcome::Rejected { reason: Reject::EmptyRecord });
}

#[tokio::test]
async fn attachment_failure_removes_the_profile() {
	let harness = harness(test_config());

	harness.completion.push_response(&cv_response("4f8a1f64-7d2a-4c38-9f1e-0d6b5a2c9e11"));
	harness.attachments.fail_insert.store(true, Ordering::SeqCst);

	let outcome = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");

	assert_eq!(outcome, IngestOutcome::Rejected { reason: Reject::AttachmentWriteFailed });
	// Both stores end up empty: the compensating delete removed the profile.
	assert!(harness.profiles.rows.lock().expect("poisoned").is_empty());
	assert!(harness.attachments.rows.lock().expect("poisoned").is_empty());
}

#[tokio::test]
async fn failed_compensation_surfaces_as_an_integrity_error() {
	let harness = harness(test_config());

	harness.completion.push_response(&cv_response("4f8a1f64-7d2a-4c38-9f1e-0d6b5a2c9e11"));
	harness.attachments.fail_insert.store(true, Ordering::SeqCst);
	harness.profiles.fail_delete.store(true, Ordering::SeqCst);

	let err = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect_err("expected an integrity error");

	assert!(matches!(err, Error::Integrity { .. }));
}

#[tokio::test]
async fn reingesting_the_same_document_is_idempotent() {
	let harness = harness(test_config());
	let embedded_id = "4f8a1f64-7d2a-4c38-9f1e-0d6b5a2c9e11";

	harness.completion.push_response(&cv_response(embedded_id));
	harness.completion.push_response(&cv_response(embedded_id));

	for _ in 0..2 {
		let outcome = harness
			.service
			.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
			.await
			.expect("ingest failed");

		assert!(matches!(outcome, IngestOutcome::Committed { .. }));
	}

	assert_eq!(harness.profiles.rows.lock().expect("poisoned").len(), 1);
	assert_eq!(harness.attachments.rows.lock().expect("poisoned").len(), 1);
}

#[tokio::test]
async fn index_failure_keeps_the_commit() {
	let harness = harness(test_config());

	harness.completion.push_response(&cv_response("4f8a1f64-7d2a-4c38-9f1e-0d6b5a2c9e11"));
	harness.vectors.fail_upsert.store(true, Ordering::SeqCst);

	let outcome = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");
	let IngestOutcome::Committed { profile_id, indexed_fragments } = outcome else {
		panic!("Expected a committed outcome, got {outcome:?}.");
	};

	assert_eq!(indexed_fragments, 0);
	assert!(harness.profiles.rows.lock().expect("poisoned").contains_key(&profile_id));
	assert!(harness.attachments.rows.lock().expect("poisoned").contains_key(&profile_id));
}
