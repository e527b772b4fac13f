use std::sync::atomic::Ordering;

use uuid::Uuid;

use vitae_service::{Error, IngestOutcome};

use super::*;

const CV_TEXT: &str = "Ada Lovelace\nSoftware engineer with Rust and SQL experience.";
const EMBEDDED_ID: &str = "4f8a1f64-7d2a-4c38-9f1e-0d6b5a2c9e11";

fn cv_response() -> String {
	format!(
		"{{\"id\": \"{EMBEDDED_ID}\", \"nome_completo\": \"Ada Lovelace\", \
		 \"competenze_tecniche\": [\"Rust\", \"SQL\"]}}"
	)
}

async fn ingest_one(harness: &TestHarness) -> Uuid {
	harness.completion.push_response(&cv_response());

	let outcome = harness
		.service
		.ingest_document(CV_TEXT, "ada.txt", b"%PDF-1.4")
		.await
		.expect("ingest failed");
	let IngestOutcome::Committed { profile_id, .. } = outcome else {
		panic!("Expected a committed outcome, got {outcome:?}.");
	};

	profile_id
}

#[tokio::test]
async fn removal_clears_record_attachment_and_fragments() {
	let harness = harness(test_config());
	let profile_id = ingest_one(&harness).await;

	assert!(!harness.vectors.points.lock().expect("poisoned").is_empty());

	let removed = harness.service.remove_profile(profile_id).await.expect("removal failed");

	assert!(removed);
	assert!(harness.profiles.rows.lock().expect("poisoned").is_empty());
	assert!(harness.attachments.rows.lock().expect("poisoned").is_empty());
	assert!(harness.vectors.points.lock().expect("poisoned").is_empty());
}

#[tokio::test]
async fn removing_an_unknown_profile_is_a_noop() {
	let harness = harness(test_config());
	let removed =
		harness.service.remove_profile(Uuid::from_u128(123)).await.expect("removal failed");

	assert!(!removed);
}

#[tokio::test]
async fn fragment_cleanup_failure_does_not_fail_the_removal() {
	let harness = harness(test_config());
	let profile_id = ingest_one(&harness).await;

	harness.vectors.fail_delete.store(true, Ordering::SeqCst);

	let removed = harness.service.remove_profile(profile_id).await.expect("removal failed");

	assert!(removed);
	// Record and attachment are gone; the stale fragments only warrant a warning.
	assert!(harness.profiles.rows.lock().expect("poisoned").is_empty());
	assert!(harness.attachments.rows.lock().expect("poisoned").is_empty());
	assert!(!harness.vectors.points.lock().expect("poisoned").is_empty());
}

#[tokio::test]
async fn attachment_delete_failure_leaves_both_halves_in_place() {
	let harness = harness(test_config());
	let profile_id = ingest_one(&harness).await;

	harness.attachments.fail_delete.store(true, Ordering::SeqCst);

	let err = harness
		.service
		.remove_profile(profile_id)
		.await
		.expect_err("expected a storage error");

	assert!(matches!(err, Error::Storage { .. }));
	// Nothing was removed, so the stores stay consistent.
	assert!(harness.profiles.rows.lock().expect("poisoned").contains_key(&profile_id));
	assert!(harness.attachments.rows.lock().expect("poisoned").contains_key(&profile_id));
}

#[tokio::test]
async fn profile_delete_failure_is_an_integrity_error() {
	let harness = harness(test_config());
	let profile_id = ingest_one(&harness).await;

	harness.profiles.fail_delete.store(true, Ordering::SeqCst);

	let err = harness
		.service
		.remove_profile(profile_id)
		.await
		.expect_err("expected an integrity error");

	assert!(matches!(err, Error::Integrity { .. }));
}
