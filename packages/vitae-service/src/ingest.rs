use uuid::Uuid;

use crate::{CommitOutcome, Reject, ServiceResult, VitaeService};

/// Terminal state of one document's pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IngestOutcome {
	Committed { profile_id: Uuid, indexed_fragments: usize },
	Rejected { reason: Reject },
}

impl VitaeService {
	/// The full per-document pipeline: structure, commit, index.
	///
	/// Indexing failure downgrades to a warning; durability ends at the
	/// commit. The only error that escapes is a failed compensation, which
	/// needs an operator.
	pub async fn ingest_document(
		&self,
		extracted_text: &str,
		source_name: &str,
		attachment: &[u8],
	) -> ServiceResult<IngestOutcome> {
		let record = match self.structure(extracted_text, source_name).await {
			Ok(record) => record,
			Err(reason) => return Ok(IngestOutcome::Rejected { reason }),
		};

		match self.commit(&record, source_name, attachment).await? {
			CommitOutcome::Rejected { reason } => Ok(IngestOutcome::Rejected { reason }),
			CommitOutcome::Committed { profile_id } => {
				let indexed_fragments = match self.index_profile(profile_id, &record.record).await
				{
					Ok(count) => count,
					Err(err) => {
						tracing::warn!(
							error = %err,
							%profile_id,
							"Fragment indexing failed. The profile stays committed."
						);

						0
					},
				};

				Ok(IngestOutcome::Committed { profile_id, indexed_fragments })
			},
		}
	}
}
