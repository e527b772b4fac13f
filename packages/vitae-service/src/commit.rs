use uuid::Uuid;

use crate::{Error, InsertOutcome, ProfileRow, Reject, ServiceResult, VitaeService};
use vitae_domain::CandidateRecord;

/// Result of one commit attempt. `Rejected` routes the document to the
/// quarantine path; only an integrity failure surfaces as an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
	Committed { profile_id: Uuid },
	Rejected { reason: Reject },
}

impl VitaeService {
	/// Writes a profile and its attachment so that both exist or neither does.
	///
	/// Record write first, then the attachment; a failed attachment write is
	/// compensated by deleting the record. Both halves skip idempotently when
	/// the identifier is already present, so a re-run of the same document is
	/// safe.
	pub async fn commit(
		&self,
		record: &CandidateRecord,
		source_name: &str,
		attachment: &[u8],
	) -> ServiceResult<CommitOutcome> {
		let profile_id = record.profile_id;
		let row = ProfileRow {
			profile_id,
			source_name: source_name.to_string(),
			record: record.record.clone(),
		};

		match self.stores.profiles.insert(&row).await {
			Ok(InsertOutcome::Created) => {
				tracing::info!(%profile_id, source = source_name, "Stored candidate profile.");
			},
			Ok(InsertOutcome::AlreadyExists) => {
				tracing::info!(%profile_id, "Profile already stored. Skipping duplicate insert.");
			},
			Err(err) => {
				tracing::error!(error = %err, %profile_id, "Profile write failed.");

				return Ok(CommitOutcome::Rejected { reason: Reject::RecordWriteFailed });
			},
		}

		match self.write_attachment(profile_id, attachment).await {
			Ok(()) => Ok(CommitOutcome::Committed { profile_id }),
			Err(err) => {
				tracing::error!(
					error = %err,
					%profile_id,
					"Attachment write failed. Removing the profile to keep stores consistent."
				);

				if let Err(delete_err) = self.stores.profiles.delete(profile_id).await {
					// The one acknowledged gap: a record now exists without its
					// attachment and must be reconciled by an operator.
					tracing::error!(
						error = %delete_err,
						%profile_id,
						"FATAL integrity: compensating delete failed. Profile exists without its attachment."
					);

					return Err(Error::Integrity {
						message: format!(
							"Profile {profile_id} exists without its attachment: {delete_err}"
						),
					});
				}

				Ok(CommitOutcome::Rejected { reason: Reject::AttachmentWriteFailed })
			},
		}
	}

	async fn write_attachment(&self, profile_id: Uuid, attachment: &[u8]) -> ServiceResult<()> {
		if self.stores.attachments.exists(profile_id).await? {
			tracing::info!(%profile_id, "Attachment already stored. Skipping duplicate insert.");

			return Ok(());
		}

		self.stores.attachments.insert(profile_id, attachment).await
	}
}
